use std::io;
use std::thread::{Builder, JoinHandle};

/// Spawns `f` on a named OS thread.
///
/// Naming threads up front means panics and `tracing` spans emitted from
/// them are attributable instead of showing up as `<unnamed>`.
pub fn spawn_named<F, T>(name: impl Into<String>, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Builder::new().name(name.into()).spawn(f)
}
