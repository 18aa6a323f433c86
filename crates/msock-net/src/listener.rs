use std::io;
use std::net::TcpListener;
use std::sync::Arc;

use msock::{Connection, ConnectionHandler, ConnectionOptions, NoopHandler};

use crate::uri::{Endpoint, UriError};

enum Inner {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixListener),
}

/// A bound `tcp://` or `unix://` socket. This is the per-accept half of the
/// acceptor contract only — it hands back one connected [`Connection`] per
/// call to [`Listener::accept_one`] and does not run a standing accept loop;
/// a host wanting that composes it from `incoming()` or by looping itself.
pub struct Listener {
    inner: Inner,
}

impl Listener {
    pub fn bind(uri: &str) -> Result<Self, UriError> {
        let inner = match Endpoint::parse(uri)? {
            Endpoint::Tcp { host, port } => Inner::Tcp(TcpListener::bind((host.as_str(), port))?),
            #[cfg(unix)]
            Endpoint::Unix { path } => {
                let _ = std::fs::remove_file(&path);
                Inner::Unix(std::os::unix::net::UnixListener::bind(&path)?)
            }
            #[cfg(not(unix))]
            Endpoint::Unix { .. } => {
                return Err(UriError::UnsupportedScheme("unix".to_string()));
            }
        };
        Ok(Self { inner })
    }

    /// Accepts one inbound connection, wraps it as a [`Connection`], and
    /// opens it (starts the receive thread) before returning it.
    pub fn accept_one(
        &self,
        options: ConnectionOptions,
        handler: Arc<dyn ConnectionHandler>,
    ) -> io::Result<Arc<Connection>> {
        let stream: Box<dyn msock::Stream> = match &self.inner {
            Inner::Tcp(listener) => Box::new(listener.accept()?.0),
            #[cfg(unix)]
            Inner::Unix(listener) => Box::new(listener.accept()?.0),
        };

        let conn = Connection::new(stream, options, handler)?;
        conn.open();
        Ok(conn)
    }

    /// Convenience for `accept_one` in a loop with default options and a
    /// no-op handler — each `next()` call blocks until a peer connects.
    pub fn incoming(&self) -> impl Iterator<Item = io::Result<Arc<Connection>>> + '_ {
        std::iter::from_fn(move || {
            Some(self.accept_one(ConnectionOptions::default(), Arc::new(NoopHandler)))
        })
    }
}
