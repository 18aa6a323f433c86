use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::connection::Connection;
use crate::options::ConnectionOptions;
use crate::ringbuffer::RingBuffer;

/// Only `Data` is meaningful to this core; `Control` is reserved for a host
/// that wants to reserve channel 0 for its own out-of-band protocol (see the
/// control-channel open question in the design notes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    Control,
    Data,
}

/// One logical ordered byte-stream multiplexed over a [`Connection`].
///
/// A Channel owns two [`RingBuffer`]s — `send_buf` fed by the application
/// and drained by this channel's dedicated send-worker thread, `recv_buf`
/// fed by the connection's receive thread and drained by the application.
/// The back-reference to `Connection` is a [`Weak`] pointer: connections own
/// channels, not the other way around, so this avoids a reference cycle.
pub struct Channel {
    id: u32,
    channel_type: ChannelType,
    connection: Weak<Connection>,
    send_buf: RingBuffer,
    recv_buf: RingBuffer,
    closed: AtomicBool,
    send_chunk_size: usize,
}

impl Channel {
    pub(crate) fn new(
        id: u32,
        channel_type: ChannelType,
        connection: Weak<Connection>,
        options: ConnectionOptions,
    ) -> Arc<Self> {
        let channel = Arc::new(Self {
            id,
            channel_type,
            connection,
            send_buf: RingBuffer::new(options.channel_buffer_size()),
            recv_buf: RingBuffer::new(options.channel_buffer_size()),
            closed: AtomicBool::new(false),
            send_chunk_size: options.send_chunk_size(),
        });

        let worker = Arc::clone(&channel);
        let name = format!("msock-chan-{id}-send");
        if let Err(err) = msock_utils::spawn_named(name, move || worker.send_worker_loop()) {
            debug!(channel_id = id, ?err, "failed to spawn channel send worker");
        }

        channel
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Enqueues bytes into the send buffer, returning how many were
    /// accepted. A single ring-buffer write — may be short under
    /// backpressure.
    pub fn send(&self, data: &[u8]) -> usize {
        self.send_buf.write(data)
    }

    /// Enqueues all of `data`, blocking until every byte is accepted or the
    /// channel closes.
    pub fn write(&self, data: &[u8]) {
        self.send_buf.writeall(data);
    }

    /// Dequeues up to `n` bytes, blocking until at least one is available
    /// or EOF is observed. An empty result means the remote side closed
    /// and the buffer has been fully drained.
    pub fn recv(&self, n: usize) -> Vec<u8> {
        self.recv_buf.read(n)
    }

    /// Reads exactly `n` bytes unless EOF occurs first, in which case the
    /// short read collected so far is returned.
    pub fn read(&self, n: usize) -> Vec<u8> {
        self.recv_buf.readall(n)
    }

    /// Marks the channel closed and closes the send buffer. The send
    /// worker observes the closed+drained send buffer, emits the in-band
    /// EOF frame, and closes the receive buffer in turn.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.send_buf.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn is_send_half_closed(&self) -> bool {
        self.send_buf.is_closed()
    }

    pub fn is_recv_half_closed(&self) -> bool {
        self.recv_buf.is_closed()
    }

    /// Called only by the connection's receive thread when a frame for
    /// this channel arrives. An empty payload is the in-band EOF marker.
    pub(crate) fn on_data(&self, payload: &[u8]) {
        if payload.is_empty() {
            debug!(channel_id = self.id, "remote closed channel");
            self.recv_buf.close();
        } else {
            self.recv_buf.writeall(payload);
        }
    }

    fn send_worker_loop(self: Arc<Self>) {
        loop {
            let chunk = self.send_buf.read(self.send_chunk_size);

            if chunk.is_empty() {
                if let Some(conn) = self.connection.upgrade() {
                    let _ = conn.send(self.id, &[]);
                }
                self.recv_buf.close();
                return;
            }

            let Some(conn) = self.connection.upgrade() else {
                self.recv_buf.close();
                return;
            };

            if let Err(err) = conn.send(self.id, &chunk) {
                debug!(channel_id = self.id, ?err, "channel send worker stopping after send error");
                self.recv_buf.close();
                return;
            }
        }
    }
}
