use std::io::{self, Read, Write};

/// Desynchronization detector prefixed to every frame. If this is ever read
/// as anything else, the stream is out of sync and the connection must close.
pub const MAGIC: u32 = 0x5A5A_5A5A;

/// `magic (4) + channel_id (4) + length (4)`, little-endian.
pub const HEADER_SIZE: usize = 12;

/// Default cap on a frame's declared payload length (see
/// [`crate::ConnectionOptions::max_frame_len`]). Prevents a corrupt or
/// hostile header from making the reader allocate/read unboundedly.
pub const DEFAULT_MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: u32,
    pub channel_id: u32,
    pub length: u32,
}

impl FrameHeader {
    pub fn new(channel_id: u32, length: u32) -> Self {
        Self { magic: MAGIC, channel_id, length }
    }

    pub fn encode(self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.channel_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Self {
        Self {
            magic: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            channel_id: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            length: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }

    pub fn is_magic_valid(self) -> bool {
        self.magic == MAGIC
    }
}

/// Outcome of attempting to read one frame header off the stream.
pub enum HeaderReadOutcome {
    /// A full header was read.
    Header(FrameHeader),
    /// The stream hit EOF before any header bytes were read. Not an error —
    /// this is the ordinary way a connection ends.
    Eof,
}

/// Reads exactly `HEADER_SIZE` bytes and decodes them, treating a zero-byte
/// read at the very start as a clean connection EOF rather than a protocol
/// error (a peer that simply stops sending looks identical to one that
/// disconnects between frames).
pub fn read_header<R: Read>(stream: &mut R) -> io::Result<HeaderReadOutcome> {
    let mut buf = [0u8; HEADER_SIZE];
    let mut have = 0;

    while have < HEADER_SIZE {
        let n = stream.read(&mut buf[have..])?;
        if n == 0 {
            return if have == 0 {
                Ok(HeaderReadOutcome::Eof)
            } else {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof mid-header"))
            };
        }
        have += n;
    }

    Ok(HeaderReadOutcome::Header(FrameHeader::decode(&buf)))
}

/// Reads exactly `length` payload bytes. A zero-byte read here always closes
/// the connection (there's no "clean" mid-payload EOF).
pub fn read_payload<R: Read>(stream: &mut R, length: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; length];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Writes a complete frame (header followed by payload) to `stream`.
pub fn write_frame<W: Write>(stream: &mut W, channel_id: u32, payload: &[u8]) -> io::Result<()> {
    let header = FrameHeader::new(channel_id, payload.len() as u32).encode();
    stream.write_all(&header)?;
    if !payload.is_empty() {
        stream.write_all(payload)?;
    }
    Ok(())
}
