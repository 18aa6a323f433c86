//! End-to-end tests driving real `Connection`s over loopback TCP pairs.

use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use msock::{Connection, ConnectionOptions, NoopHandler};

fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

fn open_pair(options: ConnectionOptions) -> (Arc<Connection>, Arc<Connection>) {
    let (a, b) = tcp_pair();
    let conn_a = Connection::new(Box::new(a), options, Arc::new(NoopHandler)).unwrap();
    let conn_b = Connection::new(Box::new(b), options, Arc::new(NoopHandler)).unwrap();
    conn_a.open();
    conn_b.open();
    (conn_a, conn_b)
}

#[test]
fn single_channel_echo() {
    let (client, server) = open_pair(ConnectionOptions::default());

    let chan_client = client.create_channel(Some(1)).unwrap();
    let chan_server = server.create_channel(Some(1)).unwrap();

    chan_client.write(b"hello world");
    assert_eq!(chan_server.read(11), b"hello world");

    chan_server.write(b"echo back");
    assert_eq!(chan_client.read(9), b"echo back");

    client.close();
    server.close();
}

#[test]
fn two_channels_interleave_independently() {
    let (client, server) = open_pair(ConnectionOptions::default());

    let chan_a_client = client.create_channel(Some(0)).unwrap();
    let chan_b_client = client.create_channel(Some(1)).unwrap();
    let chan_a_server = server.create_channel(Some(0)).unwrap();
    let chan_b_server = server.create_channel(Some(1)).unwrap();

    chan_a_client.write(b"on channel a");
    chan_b_client.write(b"on channel b");

    assert_eq!(chan_a_server.read(12), b"on channel a");
    assert_eq!(chan_b_server.read(12), b"on channel b");

    client.close();
    server.close();
}

#[test]
fn data_for_unknown_channel_is_discarded_without_closing() {
    let (client, server) = open_pair(ConnectionOptions::default());

    // client sends on a channel the server never created; connection must
    // stay open and a subsequent, known channel still works.
    client.send(99, b"nobody home").unwrap();

    let chan_client = client.create_channel(Some(1)).unwrap();
    let chan_server = server.create_channel(Some(1)).unwrap();
    chan_client.write(b"still alive");
    assert_eq!(chan_server.read(11), b"still alive");

    assert!(!server.is_closed());

    client.close();
    server.close();
}

#[test]
fn channel_close_delivers_eof_to_peer() {
    let (client, server) = open_pair(ConnectionOptions::default());

    let chan_client = client.create_channel(Some(1)).unwrap();
    let chan_server = server.create_channel(Some(1)).unwrap();

    chan_client.write(b"last message");
    chan_client.close();

    assert_eq!(chan_server.read(12), b"last message");
    // after the writer closes, the reader observes EOF (empty read)
    assert_eq!(chan_server.recv(1), Vec::<u8>::new());

    client.close();
    server.close();
}

#[test]
fn connection_close_cascades_to_channels() {
    let (client, server) = open_pair(ConnectionOptions::default());

    let chan_client = client.create_channel(Some(1)).unwrap();
    let chan_server = server.create_channel(Some(1)).unwrap();

    client.close();

    // give the server's receive thread a moment to observe the socket EOF
    std::thread::sleep(Duration::from_millis(100));

    assert!(server.is_closed());
    assert!(chan_server.is_closed() || chan_server.is_recv_half_closed());
    assert!(chan_client.is_closed());
}

#[test]
fn oversized_frame_closes_connection() {
    let options = ConnectionOptions::default().with_max_frame_len(16);
    let (client, server) = open_pair(options);

    let chan_client = client.create_channel(Some(1)).unwrap();
    let _chan_server = server.create_channel(Some(1)).unwrap();

    // bypass the channel API to push an oversized frame directly
    client.send(chan_client.id(), &[0u8; 64]).unwrap();

    std::thread::sleep(Duration::from_millis(100));
    assert!(server.is_closed());

    client.close();
}

#[test]
fn duplicate_channel_id_is_rejected() {
    let (client, _server) = open_pair(ConnectionOptions::default());

    client.create_channel(Some(5)).unwrap();
    let err = client.create_channel(Some(5)).unwrap_err();
    assert!(matches!(err, msock::ConnectionError::DuplicateChannel(5)));

    client.close();
}

#[test]
fn auto_allocated_channel_ids_increase() {
    let (client, _server) = open_pair(ConnectionOptions::default());

    let first = client.create_channel(None).unwrap();
    let second = client.create_channel(None).unwrap();
    assert_eq!(first.id(), 0);
    assert_eq!(second.id(), 1);

    client.close();
}

#[test]
fn backpressure_blocks_until_drained() {
    let options = ConnectionOptions::default().with_channel_buffer_size(4).with_send_chunk_size(4);
    let (client, server) = open_pair(options);

    let chan_client = client.create_channel(Some(1)).unwrap();
    let chan_server = server.create_channel(Some(1)).unwrap();

    let payload = vec![7u8; 256];
    let writer = {
        let chan_client = Arc::clone(&chan_client);
        let payload = payload.clone();
        std::thread::spawn(move || chan_client.write(&payload))
    };

    let received = chan_server.read(payload.len());
    writer.join().unwrap();

    assert_eq!(received, payload);

    client.close();
    server.close();
}
