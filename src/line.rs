//! Line framing over an async byte transport.
//!
//! Receive rules:
//! - printable bytes (`>= 0x20`) are kept,
//! - `\n` ends the line,
//! - any other control byte (`\r`, `\t`...) is dropped,
//! - after [`MAX_LINE_LEN`] bytes the rest of the line is discarded.
//!
//! Outbound lines end in `\r\n`.
//!
//! The partially received line lives in the channel, not in the read future,
//! so a read that is cancelled (by an authority flip) loses nothing unless
//! [`LineChannel::discard_partial`] is called.

use embedded_io_async::{Read, Write};
use heapless::Vec;

use crate::config::MAX_LINE_LEN;
use crate::error::LinkError;

/// One received line, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line(Vec<u8, MAX_LINE_LEN>);

impl Line {
    /// Raw bytes of the line.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// `true` for a bare line terminator.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Text of the line, or `"<binary>"` if it is not UTF-8.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or("<binary>")
    }
}

/// Reads and writes whole lines on a byte transport.
pub struct LineChannel<T> {
    io: T,
    pending: Vec<u8, MAX_LINE_LEN>,
    truncated: bool,
}

impl<T> LineChannel<T> {
    /// Wraps `io` with an empty receive buffer.
    pub fn new(io: T) -> Self {
        Self {
            io,
            pending: Vec::new(),
            truncated: false,
        }
    }

    /// Underlying transport.
    pub fn transport(&mut self) -> &mut T {
        &mut self.io
    }

    /// Drops any partially received line.
    pub fn discard_partial(&mut self) {
        if !self.pending.is_empty() {
            log_debug!("Dropping {} buffered bytes", self.pending.len());
        }
        self.pending.clear();
        self.truncated = false;
    }

    /// Feeds one received byte; returns the line once it is complete.
    fn push_byte(&mut self, byte: u8) -> Option<Line> {
        match byte {
            b'\n' => {
                if self.truncated {
                    log_warn!("Line longer than {} characters truncated", MAX_LINE_LEN);
                }
                self.truncated = false;
                Some(Line(core::mem::take(&mut self.pending)))
            }
            b' '..=u8::MAX => {
                if self.pending.push(byte).is_err() {
                    self.truncated = true;
                }
                None
            }
            _ => None,
        }
    }
}

impl<T: Read + Write> LineChannel<T> {
    /// Waits for the next complete line.
    ///
    /// Cancel-safe: bytes already received stay buffered.
    pub async fn read_line(&mut self) -> Result<Line, LinkError> {
        let mut byte = [0u8; 1];
        loop {
            let n = match self.io.read(&mut byte).await {
                Ok(n) => n,
                Err(_) => {
                    self.discard_partial();
                    return Err(LinkError::Read);
                }
            };
            if n == 0 {
                return Err(LinkError::Closed);
            }
            if let Some(line) = self.push_byte(byte[0]) {
                return Ok(line);
            }
        }
    }

    /// Sends `text` followed by a line break.
    pub async fn write_line(&mut self, text: &str) -> Result<(), LinkError> {
        self.io
            .write_all(text.as_bytes())
            .await
            .map_err(|_| LinkError::Write)?;
        self.io.write_all(b"\r\n").await.map_err(|_| LinkError::Write)?;
        self.io.flush().await.map_err(|_| LinkError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSerial;
    use embassy_futures::block_on;

    #[test]
    fn test_reads_lines_in_order() {
        let mut channel = LineChannel::new(MockSerial::with_input("up\ndown\n"));
        assert_eq!(block_on(channel.read_line()).unwrap().as_bytes(), b"up");
        assert_eq!(block_on(channel.read_line()).unwrap().as_bytes(), b"down");
    }

    #[test]
    fn test_drops_control_bytes() {
        let mut channel = LineChannel::new(MockSerial::with_input("in\tizio\r\n"));
        let line = block_on(channel.read_line()).unwrap();
        assert_eq!(line.as_str(), "inizio");
    }

    #[test]
    fn test_empty_line() {
        let mut channel = LineChannel::new(MockSerial::with_input("\r\n"));
        assert!(block_on(channel.read_line()).unwrap().is_empty());
    }

    #[test]
    fn test_truncates_long_lines() {
        let long = "x".repeat(MAX_LINE_LEN + 15);
        let input = format!("{}\nup\n", long);
        let mut channel = LineChannel::new(MockSerial::with_input(&input));

        let line = block_on(channel.read_line()).unwrap();
        assert_eq!(line.as_bytes().len(), MAX_LINE_LEN);
        // The overflow does not leak into the next line
        assert_eq!(block_on(channel.read_line()).unwrap().as_bytes(), b"up");
    }

    #[test]
    fn test_partial_line_survives_until_discarded() {
        let mut channel = LineChannel::new(MockSerial::with_input(""));
        for &byte in b"dow" {
            assert!(channel.push_byte(byte).is_none());
        }
        channel.transport().feed("n\n");
        assert_eq!(block_on(channel.read_line()).unwrap().as_bytes(), b"down");

        for &byte in b"dow" {
            channel.push_byte(byte);
        }
        channel.discard_partial();
        channel.transport().feed("up\n");
        assert_eq!(block_on(channel.read_line()).unwrap().as_bytes(), b"up");
    }

    #[test]
    fn test_read_error_drops_partial_line() {
        let mut channel = LineChannel::new(MockSerial::with_input("do"));
        channel.transport().feed_read_error();
        channel.transport().feed("wn\n");

        assert_eq!(block_on(channel.read_line()), Err(LinkError::Read));
        assert_eq!(block_on(channel.read_line()).unwrap().as_bytes(), b"wn");
    }

    #[test]
    fn test_write_error() {
        let mut channel = LineChannel::new(MockSerial::with_input(""));
        channel.transport().set_write_failure(true);
        assert_eq!(block_on(channel.write_line("hello")), Err(LinkError::Write));
    }

    #[test]
    fn test_non_utf8_line() {
        let mut channel = LineChannel::new(MockSerial::with_bytes(&[0xC3, b'\n']));
        let line = block_on(channel.read_line()).unwrap();
        assert_eq!(line.as_str(), "<binary>");
    }

    #[test]
    fn test_closed_transport() {
        let mut channel = LineChannel::new(MockSerial::closed());
        assert_eq!(block_on(channel.read_line()), Err(LinkError::Closed));
    }

    #[test]
    fn test_write_line_appends_crlf() {
        let mut channel = LineChannel::new(MockSerial::with_input(""));
        block_on(channel.write_line("hello")).unwrap();
        assert_eq!(channel.transport().output_text(), "hello\r\n");
    }
}
