//! Error types.
//!
//! Nothing here is fatal: every [`ControlError`] is reported to the operator
//! as one status line and the state machine returns to an idle state.

use core::fmt;

/// Operator-facing rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Terminal input other than `up` / `down`
    CommandNotRecognized,
    /// Selector mode input other than the begin token
    MustBeginFirst,
    /// Edit window closed with something other than the commit token
    EditNotApplied,
    /// Selector digits are not valid BCD or exceed 100%
    InvalidBcdEncoding,
}

impl ControlError {
    /// Human-readable text sent back on the terminal.
    pub const fn message(self) -> &'static str {
        match self {
            Self::CommandNotRecognized => "Command not recognised",
            Self::MustBeginFirst => "Type \"inizio\" before changing the duty cycle",
            Self::EditNotApplied => "Duty cycle not changed",
            Self::InvalidBcdEncoding => {
                "Invalid BCD setting: each digit must be 0-9 and the total at most 100"
            }
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Byte transport faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Receive failed (framing, noise, overrun...)
    Read,
    /// Transmit failed
    Write,
    /// The transport reported end of stream
    Closed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read failed"),
            Self::Write => f.write_str("write failed"),
            Self::Closed => f.write_str("transport closed"),
        }
    }
}
