//! `tcp://` and `unix://` endpoint setup for [`msock::Connection`].
//!
//! This crate owns URI dispatch and the actual `bind`/`connect`/`accept`
//! calls; everything past the initial handshake (framing, channels,
//! backpressure) lives in `msock` itself.

mod dialer;
mod listener;
mod uri;

pub use dialer::Dialer;
pub use listener::Listener;
pub use uri::{Endpoint, UriError};
