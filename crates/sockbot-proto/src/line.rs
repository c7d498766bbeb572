//! Line-based codec for tokio.
//!
//! Reads CRLF (or bare LF) terminated lines and writes lines with a single
//! CRLF terminator. Incoming bytes are decoded leniently: networks still
//! carry Latin-1 clients, and a bot should not drop a message over one
//! stray byte.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error;

/// Default line limit in bytes (RFC 1459 message size).
pub const DEFAULT_MAX_LEN: usize = 512;

/// Line-based codec that handles newline-terminated messages.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Reject lines carrying illegal control characters
    strict: bool,
}

impl LineCodec {
    /// Create a codec with the default 512 byte limit.
    pub fn new() -> Self {
        Self {
            next_index: 0,
            max_len: DEFAULT_MAX_LEN,
            strict: true,
        }
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            strict: true,
        }
    }

    /// Accept control characters instead of failing the stream.
    ///
    /// A decode error ends a `Framed` stream, so a client that must survive
    /// whatever peers send should read leniently.
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    fn validate_line(s: &str) -> error::Result<()> {
        for ch in s.chars() {
            if is_illegal_control_char(ch) {
                return Err(error::ProtocolError::IllegalControlChar(ch));
            }
        }
        Ok(())
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// BEL and control characters other than CR, LF, NUL and the mIRC
/// formatting codes are rejected.
#[inline]
pub fn is_illegal_control_char(ch: char) -> bool {
    if ch == '\x07' {
        return true;
    }
    ch.is_control() && ch != '\r' && ch != '\n' && ch != '\0' && !is_format_code(ch)
}

#[inline]
fn is_format_code(ch: char) -> bool {
    matches!(
        ch,
        '\x01' | '\x02' | '\x03' | '\x04' | '\x0F' | '\x11' | '\x16' | '\x1D' | '\x1E' | '\x1F'
    )
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(error::ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let data = String::from_utf8_lossy(&line)
                .trim_end_matches(['\r', '\n'])
                .to_owned();
            if self.strict {
                Self::validate_line(&data)?;
            }

            Ok(Some(data))
        } else {
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(error::ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        // Anything after the first line break would be read by the server as
        // a second command.
        let end = msg.find(['\r', '\n']).unwrap_or(msg.len());
        dst.reserve(end + 2);
        dst.extend_from_slice(&msg.as_bytes()[..end]);
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}
