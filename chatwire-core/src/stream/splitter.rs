//! Incremental event-stream framing
//!
//! Chunks arrive at whatever granularity the transport delivers. The splitter
//! decodes them as UTF-8 with a carry for code points cut at a chunk boundary
//! and yields every blank-line terminated frame in arrival order.

use std::mem;

/// Separator between two frames
pub const FRAME_SEPARATOR: &str = "\n\n";

/// Longest possible UTF-8 sequence
const MAX_UTF8_LEN: usize = 4;

/// Incremental splitter from raw bytes to complete frames
#[derive(Debug, Default)]
pub struct FrameSplitter {
    /// Bytes of an incomplete trailing code point from the previous chunk
    carry: Vec<u8>,
    /// Decoded text not yet terminated by a separator
    pending: String,
    /// Prefix of `pending` already searched for a separator
    scanned: usize,
}

impl FrameSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and drain every frame it completes
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode_into_pending(chunk);

        let mut frames = Vec::new();
        loop {
            // A separator may straddle the previous scan end
            let from = self.scanned.saturating_sub(FRAME_SEPARATOR.len() - 1);
            match find_separator(&self.pending.as_bytes()[from..]) {
                Some(offset) => {
                    let split = from + offset;
                    let frame = self.pending[..split].to_string();
                    self.pending.drain(..split + FRAME_SEPARATOR.len());
                    self.scanned = 0;
                    frames.push(frame);
                }
                None => {
                    self.scanned = self.pending.len();
                    return frames;
                }
            }
        }
    }

    /// Bytes buffered for the frame in progress
    pub fn buffered(&self) -> usize {
        self.pending.len() + self.carry.len()
    }

    /// End of input. Unterminated trailing content is discarded.
    ///
    /// Returns the number of discarded bytes so callers can log it.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffered();
        self.pending.clear();
        self.carry.clear();
        self.scanned = 0;
        discarded
    }

    /// Whether no partial frame or partial code point is buffered
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.carry.is_empty()
    }

    fn decode_into_pending(&mut self, chunk: &[u8]) {
        let joined;
        let mut input = if self.carry.is_empty() {
            chunk
        } else {
            let mut bytes = mem::take(&mut self.carry);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            joined.as_slice()
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.pending.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    // The prefix up to `valid_up_to` always decodes.
                    self.pending
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match err.error_len() {
                        Some(invalid) => {
                            self.pending.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[invalid..];
                        }
                        None => {
                            // Truncated sequence at the end of the chunk.
                            debug_assert!(rest.len() < MAX_UTF8_LEN);
                            self.carry.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn find_separator(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(FRAME_SEPARATOR.len())
        .position(|window| window == FRAME_SEPARATOR.as_bytes())
}
