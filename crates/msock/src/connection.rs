use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::channel::{Channel, ChannelType};
use crate::error::ConnectionError;
use crate::frame::{read_header, read_payload, write_frame, HeaderReadOutcome};
use crate::options::ConnectionOptions;
use crate::stream::Stream;

/// Capability interface supplied at construction time, invoked by the
/// connection at the lifecycle points named in the wire spec. All methods
/// are no-ops by default so a host only overrides what it cares about.
pub trait ConnectionHandler: Send + Sync {
    fn on_channel_created(&self, _channel: &Arc<Channel>) {}
    fn on_channel_destroyed(&self, _channel: &Arc<Channel>) {}
    fn on_closed(&self) {}
}

/// A [`ConnectionHandler`] that does nothing, for callers with no lifecycle
/// hooks to run.
pub struct NoopHandler;
impl ConnectionHandler for NoopHandler {}

/// Lets a host control how Channels are constructed — the Rust stand-in for
/// the source's `channel_factory(id) -> Channel` hook. Rust has no
/// subclassing, so this can change how a Channel is parameterized but not
/// its concrete type; see the design notes for why a literal control-channel
/// subclass was out of scope.
pub trait ChannelFactory: Send + Sync {
    fn create(
        &self,
        id: u32,
        channel_type: ChannelType,
        connection: std::sync::Weak<Connection>,
        options: ConnectionOptions,
    ) -> Arc<Channel>;
}

/// The `channel_factory` used unless a host supplies its own.
pub struct DefaultChannelFactory;
impl ChannelFactory for DefaultChannelFactory {
    fn create(
        &self,
        id: u32,
        channel_type: ChannelType,
        connection: std::sync::Weak<Connection>,
        options: ConnectionOptions,
    ) -> Arc<Channel> {
        Channel::new(id, channel_type, connection, options)
    }
}

/// Owns one multiplexed stream: the receive demultiplexer, the serialized
/// send path, and the channel registry.
///
/// `NEW -> OPEN -> CLOSED`. `open()` starts the receive thread; `close()` —
/// or any of remote EOF / magic mismatch / oversized frame / transport
/// error observed by the receive thread — drives the connection to
/// `CLOSED` exactly once.
pub struct Connection {
    options: ConnectionOptions,
    write_half: Mutex<Option<Box<dyn Stream>>>,
    recv_stream: Mutex<Option<Box<dyn Stream>>>,
    channels: Mutex<HashMap<u32, Arc<Channel>>>,
    closed: AtomicBool,
    recv_thread: Mutex<Option<JoinHandle<()>>>,
    handler: Arc<dyn ConnectionHandler>,
    channel_factory: Arc<dyn ChannelFactory>,
}

impl Connection {
    pub fn new(
        stream: Box<dyn Stream>,
        options: ConnectionOptions,
        handler: Arc<dyn ConnectionHandler>,
    ) -> io::Result<Arc<Self>> {
        Self::with_channel_factory(stream, options, handler, Arc::new(DefaultChannelFactory))
    }

    pub fn with_channel_factory(
        stream: Box<dyn Stream>,
        options: ConnectionOptions,
        handler: Arc<dyn ConnectionHandler>,
        channel_factory: Arc<dyn ChannelFactory>,
    ) -> io::Result<Arc<Self>> {
        let recv_stream = stream.try_clone_boxed()?;
        Ok(Arc::new(Self {
            options,
            write_half: Mutex::new(Some(stream)),
            recv_stream: Mutex::new(Some(recv_stream)),
            channels: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
            recv_thread: Mutex::new(None),
            handler,
            channel_factory,
        }))
    }

    /// Starts the receive thread. `NEW -> OPEN`.
    pub fn open(self: &Arc<Self>) {
        let Some(stream) = self.recv_stream.lock().unwrap().take() else {
            debug!("open() called more than once, ignoring");
            return;
        };

        let conn = Arc::clone(self);
        match msock_utils::spawn_named("msock-recv", move || conn.recv_loop(stream)) {
            Ok(handle) => *self.recv_thread.lock().unwrap() = Some(handle),
            Err(err) => warn!(?err, "failed to spawn receive thread"),
        }
    }

    /// Creates a channel, auto-allocating `max(existing_ids) + 1` (or `0`
    /// for an empty registry) when `id` is omitted. Channel creation is
    /// purely local — both peers are expected to create matching ids out
    /// of band; see the design notes on the control-channel open question.
    pub fn create_channel(self: &Arc<Self>, id: Option<u32>) -> Result<Arc<Channel>, ConnectionError> {
        let mut channels = self.channels.lock().unwrap();

        let id = match id {
            Some(id) => id,
            None => channels.keys().copied().max().map_or(0, |max| max + 1),
        };

        if channels.contains_key(&id) {
            return Err(ConnectionError::DuplicateChannel(id));
        }

        let channel =
            self.channel_factory.create(id, ChannelType::Data, Arc::downgrade(self), self.options);
        channels.insert(id, Arc::clone(&channel));
        drop(channels);

        self.handler.on_channel_created(&channel);
        Ok(channel)
    }

    /// Removes `id` from the registry, if present.
    pub fn destroy_channel(&self, id: u32) {
        let removed = self.channels.lock().unwrap().remove(&id);
        if let Some(channel) = removed {
            self.handler.on_channel_destroyed(&channel);
        }
    }

    /// Frames `(magic, channel_id, len(data))` and writes header-then-payload
    /// under the send mutex. A broken pipe is swallowed — the receive thread
    /// will observe the peer's disappearance and drive shutdown. On a
    /// closed connection, sends are silently dropped (no error).
    pub fn send(&self, channel_id: u32, data: &[u8]) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut guard = self.write_half.lock().unwrap();
        let Some(stream) = guard.as_mut() else {
            return Ok(());
        };

        match write_frame(stream, channel_id, data) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                debug!(channel_id, "broken pipe on send, awaiting receive thread shutdown");
                Ok(())
            }
            Err(err) => Err(ConnectionError::Transport(err)),
        }
    }

    /// Idempotent. Drives the connection to `CLOSED` and joins the receive
    /// thread (unless called from within that thread, which must not join
    /// itself).
    pub fn close(self: &Arc<Self>) {
        self.shutdown();

        let handle = self.recv_thread.lock().unwrap().take();
        if let Some(handle) = handle {
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Single-entry, idempotent shutdown path shared by the public `close()`
    /// and the receive thread's own error/EOF handling (which cannot call
    /// `close()` without deadlocking on its own join).
    fn shutdown(self: &Arc<Self>) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let channels: Vec<Arc<Channel>> = {
            let mut map = self.channels.lock().unwrap();
            let channels = map.values().cloned().collect();
            map.clear();
            channels
        };
        for channel in channels {
            channel.close();
        }

        {
            let mut guard = self.write_half.lock().unwrap();
            if let Some(stream) = guard.take() {
                let _ = stream.shutdown_both();
            }
        }

        self.handler.on_closed();
    }

    fn recv_loop(self: Arc<Self>, mut stream: Box<dyn Stream>) {
        loop {
            let header = match read_header(&mut stream) {
                Ok(HeaderReadOutcome::Header(header)) => header,
                Ok(HeaderReadOutcome::Eof) => {
                    debug!("connection EOF");
                    break;
                }
                Err(err) => {
                    debug!(?err, "transport read error, closing connection");
                    break;
                }
            };

            if !header.is_magic_valid() {
                warn!(magic = header.magic, "bad magic, closing connection");
                break;
            }

            if header.length > self.options.max_frame_len() {
                warn!(
                    length = header.length,
                    max = self.options.max_frame_len(),
                    "frame exceeds max_frame_len, closing connection"
                );
                break;
            }

            let payload = match read_payload(&mut stream, header.length as usize) {
                Ok(payload) => payload,
                Err(err) => {
                    debug!(?err, "transport read error reading payload, closing connection");
                    break;
                }
            };

            let channel = self.channels.lock().unwrap().get(&header.channel_id).cloned();
            match channel {
                Some(channel) => channel.on_data(&payload),
                None => warn!(channel_id = header.channel_id, "data from unknown channel, discarding"),
            }
        }

        self.shutdown();
    }
}
