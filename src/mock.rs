//! Host test doubles for the hardware collaborators.

use core::convert::Infallible;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use embedded_hal::digital::v2::{InputPin, OutputPin};
use embedded_io::{ErrorKind, ErrorType};
use embedded_io_async::{Read, Write};

use crate::duty::PwmOutput;

/// Scripted serial port. Reads pend forever once the script runs out.
///
/// The script may contain read faults between bytes; writes fail while
/// [`MockSerial::set_write_failure`] is on.
#[derive(Debug, Default)]
pub struct MockSerial {
    input: VecDeque<Result<u8, ErrorKind>>,
    output: Vec<u8>,
    closed: bool,
    fail_writes: bool,
}

impl MockSerial {
    pub fn with_input(text: &str) -> Self {
        Self::with_bytes(text.as_bytes())
    }

    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self {
            input: bytes.iter().copied().map(Ok).collect(),
            ..Self::default()
        }
    }

    /// A port whose reads report end of stream.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    pub fn feed(&mut self, text: &str) {
        self.input.extend(text.bytes().map(Ok));
    }

    /// Queues a read fault after the bytes fed so far.
    pub fn feed_read_error(&mut self) {
        self.input.push_back(Err(ErrorKind::Other));
    }

    pub fn set_write_failure(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    pub fn output_lines(&self) -> Vec<String> {
        self.output_text()
            .split_terminator("\r\n")
            .map(String::from)
            .collect()
    }

    pub fn last_line(&self) -> String {
        self.output_lines().pop().unwrap_or_default()
    }
}

impl ErrorType for MockSerial {
    type Error = ErrorKind;
}

impl Read for MockSerial {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.closed {
            return Ok(0);
        }
        if self.input.is_empty() {
            core::future::pending::<()>().await;
        }

        if let Some(Err(kind)) = self.input.front() {
            let kind = *kind;
            self.input.pop_front();
            return Err(kind);
        }

        let mut n = 0;
        while n < buf.len() {
            match self.input.front() {
                Some(Ok(byte)) => {
                    buf[n] = *byte;
                    n += 1;
                    self.input.pop_front();
                }
                _ => break,
            }
        }
        Ok(n)
    }
}

impl Write for MockSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(ErrorKind::Other);
        }
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// PWM stage that records what the mapper did to it.
#[derive(Debug)]
pub struct MockPwm {
    pub top: u16,
    pub compare: u16,
    pub running: bool,
    pub halts: u32,
    pub resumes: u32,
    pub compare_at_resume: Option<u16>,
}

impl MockPwm {
    pub fn new(top: u16) -> Self {
        Self {
            top,
            compare: 0,
            running: true,
            halts: 0,
            resumes: 0,
            compare_at_resume: None,
        }
    }
}

impl PwmOutput for MockPwm {
    fn max_compare(&self) -> u16 {
        self.top
    }

    fn set_compare(&mut self, value: u16) {
        self.compare = value;
    }

    fn halt(&mut self) {
        self.running = false;
        self.halts += 1;
    }

    fn resume(&mut self) {
        self.running = true;
        self.resumes += 1;
        self.compare_at_resume = Some(self.compare);
    }
}

/// Status LED.
#[derive(Debug, Default)]
pub struct MockLed {
    pub is_on: bool,
}

impl MockLed {
    pub fn on() -> Self {
        Self { is_on: true }
    }
}

impl OutputPin for MockLed {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.is_on = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.is_on = true;
        Ok(())
    }
}

/// Input pin fixed at one level.
#[derive(Debug, Clone, Copy)]
pub struct MockPin(bool);

impl MockPin {
    pub fn high() -> Self {
        Self(true)
    }

    pub fn low() -> Self {
        Self(false)
    }
}

impl InputPin for MockPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.0)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.0)
    }
}
