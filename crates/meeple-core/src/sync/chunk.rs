//! Message framing and chunking
//!
//! The link writes at most [`CHUNK_SIZE`] bytes at a time, so a frame may
//! arrive split across many reads. Every frame carries a u32 length prefix;
//! [`FrameAssembler`] buffers inbound bytes and yields complete frames
//! regardless of how the transport sliced them.

use thiserror::Error;

/// Largest single write the link will make
pub const CHUNK_SIZE: usize = 512;

/// Upper bound on a frame body; anything larger means a corrupt stream
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

const LEN_PREFIX: usize = 4;

/// Framing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Declared frame length is beyond any payload this protocol produces
    #[error("frame length {0} exceeds maximum {MAX_FRAME_LEN}")]
    Oversized(usize),
}

/// Prefix a payload with its length, ready for chunked writing
#[must_use]
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(LEN_PREFIX + payload.len());
    frame.extend_from_slice(&u32::try_from(payload.len()).unwrap_or(u32::MAX).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Split an encoded frame into in-order chunks of at most [`CHUNK_SIZE`]
pub fn chunks(frame: &[u8]) -> impl Iterator<Item = &[u8]> {
    frame.chunks(CHUNK_SIZE)
}

/// Incremental reassembly of length-prefixed frames
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8>,
}

impl FrameAssembler {
    /// Create an empty assembler
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes as they arrive off the link
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pop the next complete frame body, if one has fully arrived
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        if self.buf.len() < LEN_PREFIX {
            return Ok(None);
        }

        let mut prefix = [0u8; LEN_PREFIX];
        prefix.copy_from_slice(&self.buf[..LEN_PREFIX]);
        let len = u32::from_be_bytes(prefix) as usize;
        if len > MAX_FRAME_LEN {
            return Err(FrameError::Oversized(len));
        }

        if self.buf.len() < LEN_PREFIX + len {
            return Ok(None);
        }

        let frame = self.buf[LEN_PREFIX..LEN_PREFIX + len].to_vec();
        self.buf.drain(..LEN_PREFIX + len);
        Ok(Some(frame))
    }
}
