//! Newline line codec.
//!
//! Wire format (both directions):
//! ```text
//! ┌──────────────────────┬──────────────┐
//! │ UTF-8 text (N bytes) │ '\n' (or \r\n)│
//! └──────────────────────┴──────────────┘
//! ```
//!
//! The decoder accumulates incoming bytes into a fixed-capacity buffer and
//! yields complete lines.  This handles partial reads gracefully. A single
//! `Transport::read` call may return part of a line, a whole line, or
//! several lines concatenated.

use heapless::Vec;

/// Longest line the decoder will buffer (excluding the terminator).
pub const MAX_LINE_LEN: usize = 128;

/// Result of completing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded<'a> {
    /// A complete, valid UTF-8 line without its terminator.
    Line(&'a str),
    /// A complete line that is not valid UTF-8.
    Malformed,
    /// The line exceeded [`MAX_LINE_LEN`]; the rest of it is discarded.
    Overflow,
}

/// Decoder state machine.
#[derive(Clone, Copy)]
enum DecoderState {
    /// Collecting bytes of the current line.
    Collecting,
    /// A line was just returned; the buffer is cleared on the next byte.
    Complete,
    /// Dropping bytes of an over-long line until its terminator.
    Discarding,
}

/// Streaming line decoder.
pub struct LineDecoder {
    state: DecoderState,
    buf: Vec<u8, MAX_LINE_LEN>,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            state: DecoderState::Collecting,
            buf: Vec::new(),
        }
    }

    /// Feed one byte into the decoder.
    ///
    /// Returns `Some` when the byte completes a non-empty line, or on the
    /// first byte that overflows the buffer.  The returned line borrows the
    /// decoder and is valid until the next call.
    pub fn push(&mut self, byte: u8) -> Option<Decoded<'_>> {
        if matches!(self.state, DecoderState::Complete) {
            self.buf.clear();
            self.state = DecoderState::Collecting;
        }

        match self.state {
            DecoderState::Discarding => {
                if byte == b'\n' {
                    self.buf.clear();
                    self.state = DecoderState::Collecting;
                }
                None
            }
            DecoderState::Collecting | DecoderState::Complete => {
                if byte != b'\n' {
                    if self.buf.push(byte).is_err() {
                        self.state = DecoderState::Discarding;
                        return Some(Decoded::Overflow);
                    }
                    return None;
                }

                if self.buf.last() == Some(&b'\r') {
                    self.buf.pop();
                }
                if self.buf.is_empty() {
                    return None;
                }

                self.state = DecoderState::Complete;
                match core::str::from_utf8(&self.buf) {
                    Ok(line) => Some(Decoded::Line(line)),
                    Err(_) => Some(Decoded::Malformed),
                }
            }
        }
    }

    /// Drop any partially received line (e.g. after a reconnect).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = DecoderState::Collecting;
    }
}

/// Encode a text command as a newline-terminated line into `out_buf`.
/// Returns the total number of bytes written.
pub fn encode_line(text: &str, out_buf: &mut [u8]) -> Option<usize> {
    let total = text.len() + 1;
    if total > out_buf.len() || text.contains('\n') {
        return None;
    }
    out_buf[..text.len()].copy_from_slice(text.as_bytes());
    out_buf[text.len()] = b'\n';
    Some(total)
}
