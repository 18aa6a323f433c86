use std::io;

use thiserror::Error;

/// Errors surfaced by [`crate::Connection`] operations.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("channel {0} already exists")]
    DuplicateChannel(u32),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}
