//! Stream multiplexing: many ordered byte channels over one reliable,
//! in-order transport (TCP or a unix-domain socket).
//!
//! A [`Connection`] wraps a duplex [`Stream`] and demultiplexes it into any
//! number of [`Channel`]s, each an independent ordered byte pipe. Channels
//! are framed on the wire as `(magic, channel_id, length)` headers followed
//! by `length` bytes of payload; a zero-length frame is that channel's
//! in-band EOF. All I/O is blocking and thread-based — there is no event
//! loop, cooperative scheduler, or async runtime here.

mod channel;
mod connection;
mod error;
mod frame;
mod options;
mod ringbuffer;
mod stream;

pub use channel::{Channel, ChannelType};
pub use connection::{ChannelFactory, Connection, ConnectionHandler, DefaultChannelFactory, NoopHandler};
pub use error::ConnectionError;
pub use frame::DEFAULT_MAX_FRAME_LEN;
pub use options::ConnectionOptions;
pub use ringbuffer::RingBuffer;
pub use stream::Stream;
