use crate::frame::DEFAULT_MAX_FRAME_LEN;

/// Construction-time knobs shared by every [`crate::Channel`] and
/// [`crate::Connection`] built around a stream.
///
/// Builder-style: start from [`ConnectionOptions::default`] and chain the
/// `with_*` setters that matter.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionOptions {
    channel_buffer_size: usize,
    max_frame_len: u32,
    send_chunk_size: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self { channel_buffer_size: 4096, max_frame_len: DEFAULT_MAX_FRAME_LEN, send_chunk_size: 1024 }
    }
}

impl ConnectionOptions {
    /// Capacity of each Channel's send and receive ring buffers.
    ///
    /// # Panics
    /// Panics if `size < 2` — see [`crate::RingBuffer::new`].
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        assert!(size >= 2, "channel_buffer_size must be at least 2, got {size}");
        self.channel_buffer_size = size;
        self
    }

    /// Caps the payload length a peer may declare in a frame header. Frames
    /// that declare more are treated as a protocol violation and close the
    /// connection without being read.
    pub fn with_max_frame_len(mut self, max: u32) -> Self {
        self.max_frame_len = max;
        self
    }

    /// Chunk size used by each channel's send worker when draining its send
    /// buffer onto the wire. A policy knob only — any value >= 1 preserves
    /// correctness, just trades frame count for latency.
    ///
    /// # Panics
    /// Panics if `size == 0`.
    pub fn with_send_chunk_size(mut self, size: usize) -> Self {
        assert!(size >= 1, "send_chunk_size must be at least 1");
        self.send_chunk_size = size;
        self
    }

    pub fn channel_buffer_size(&self) -> usize {
        self.channel_buffer_size
    }

    pub fn max_frame_len(&self) -> u32 {
        self.max_frame_len
    }

    pub fn send_chunk_size(&self) -> usize {
        self.send_chunk_size
    }
}
