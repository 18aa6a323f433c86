use std::net::TcpStream;
use std::sync::Arc;

use msock::{Connection, ConnectionHandler, ConnectionOptions};

use crate::uri::{Endpoint, UriError};

/// Dials a `tcp://host:port` or `unix://path` endpoint and opens the
/// resulting connection.
pub struct Dialer;

impl Dialer {
    pub fn dial(
        uri: &str,
        options: ConnectionOptions,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<Arc<Connection>, UriError> {
        let stream: Box<dyn msock::Stream> = match Endpoint::parse(uri)? {
            Endpoint::Tcp { host, port } => Box::new(TcpStream::connect((host.as_str(), port))?),
            #[cfg(unix)]
            Endpoint::Unix { path } => Box::new(std::os::unix::net::UnixStream::connect(path)?),
            #[cfg(not(unix))]
            Endpoint::Unix { .. } => {
                return Err(UriError::UnsupportedScheme("unix".to_string()));
            }
        };

        let conn = Connection::new(stream, options, handler)?;
        conn.open();
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msock::NoopHandler;

    #[test]
    fn dial_connects_to_listener() {
        // bind to an ephemeral port directly, then rebind msock's Listener to
        // that concrete port so we have an address to dial.
        let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = probe.local_addr().unwrap().port();
        drop(probe);

        let listener = crate::listener::Listener::bind(&format!("tcp://127.0.0.1:{port}")).unwrap();
        let accepted = std::thread::spawn(move || {
            listener.accept_one(ConnectionOptions::default(), Arc::new(NoopHandler))
        });

        let uri = format!("tcp://127.0.0.1:{port}");
        let client = Dialer::dial(&uri, ConnectionOptions::default(), Arc::new(NoopHandler)).unwrap();
        let server = accepted.join().unwrap().unwrap();

        client.close();
        server.close();
    }
}
