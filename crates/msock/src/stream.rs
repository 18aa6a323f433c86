use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A duplex byte stream a [`crate::Connection`] can be built around.
///
/// Implemented for [`std::net::TcpStream`] and, on unix, for
/// [`std::os::unix::net::UnixStream`] — the two transports named in the
/// wire spec's `tcp://` / `unix://` schemes. `try_clone_boxed` gives the
/// receive thread its own handle onto the same underlying socket so reads
/// and (mutex-serialized) writes never contend on one `&mut`.
pub trait Stream: Read + Write + Send + 'static {
    fn try_clone_boxed(&self) -> io::Result<Box<dyn Stream>>;
    fn shutdown_both(&self) -> io::Result<()>;
}

impl Stream for TcpStream {
    fn try_clone_boxed(&self) -> io::Result<Box<dyn Stream>> {
        Ok(Box::new(self.try_clone()?))
    }

    fn shutdown_both(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

#[cfg(unix)]
impl Stream for std::os::unix::net::UnixStream {
    fn try_clone_boxed(&self) -> io::Result<Box<dyn Stream>> {
        Ok(Box::new(self.try_clone()?))
    }

    fn shutdown_both(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}
