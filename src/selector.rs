//! BCD digit selectors.
//!
//! Three selectors give the hundreds (1 bit), tens (4 bits) and units
//! (4 bits) of the duty cycle. The sampling task writes their state into
//! [`SelectorDigits`] whenever it changes; the controller reads a copy only
//! when an edit is committed.
//!
//! The nine bits are packed into one atomic word, so a reader never sees a
//! half-written update.

use embedded_hal::digital::v2::InputPin;
use portable_atomic::{AtomicU16, Ordering};

use crate::bcd;
use crate::duty::DutyCycle;
use crate::error::ControlError;

pub const HUNDREDS_WIDTH: usize = 1;
pub const TENS_WIDTH: usize = 4;
pub const UNITS_WIDTH: usize = 4;

const UNITS_SHIFT: u32 = 0;
const TENS_SHIFT: u32 = UNITS_SHIFT + UNITS_WIDTH as u32;
const HUNDREDS_SHIFT: u32 = TENS_SHIFT + TENS_WIDTH as u32;

/// One observation of all selector bits, each digit MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SelectorSnapshot {
    pub hundreds: [bool; HUNDREDS_WIDTH],
    pub tens: [bool; TENS_WIDTH],
    pub units: [bool; UNITS_WIDTH],
}

impl SelectorSnapshot {
    /// Builds a snapshot from raw digit values (truncated to each width).
    pub const fn from_digits(hundreds: u16, tens: u16, units: u16) -> Self {
        Self {
            hundreds: bcd::encode(hundreds),
            tens: bcd::encode(tens),
            units: bcd::encode(units),
        }
    }

    /// Decoded `(hundreds, tens, units)`.
    pub const fn digits(&self) -> (u16, u16, u16) {
        (
            bcd::decode(&self.hundreds),
            bcd::decode(&self.tens),
            bcd::decode(&self.units),
        )
    }

    /// Decodes and composes the selected duty cycle.
    pub fn compose(&self) -> Result<DutyCycle, ControlError> {
        let (hundreds, tens, units) = self.digits();
        compose(hundreds, tens, units)
    }

    const fn pack(&self) -> u16 {
        let (hundreds, tens, units) = self.digits();
        (hundreds << HUNDREDS_SHIFT) | (tens << TENS_SHIFT) | (units << UNITS_SHIFT)
    }

    const fn unpack(word: u16) -> Self {
        Self::from_digits(
            (word >> HUNDREDS_SHIFT) & 0x1,
            (word >> TENS_SHIFT) & 0xF,
            (word >> UNITS_SHIFT) & 0xF,
        )
    }
}

/// Combines decoded digits into a duty cycle.
///
/// Each digit must be a valid decimal digit (hundreds at most 1) and the
/// total must not exceed 100%.
pub fn compose(hundreds: u16, tens: u16, units: u16) -> Result<DutyCycle, ControlError> {
    if hundreds > 1 || tens > 9 || units > 9 {
        return Err(ControlError::InvalidBcdEncoding);
    }

    let value = 100 * hundreds + 10 * tens + units;
    u8::try_from(value)
        .ok()
        .and_then(DutyCycle::new)
        .ok_or(ControlError::InvalidBcdEncoding)
}

/// Latest selector state, shared between the sampling task and the controller.
pub struct SelectorDigits {
    word: AtomicU16,
}

impl SelectorDigits {
    /// All selectors at zero until the first sample.
    pub const fn new() -> Self {
        Self {
            word: AtomicU16::new(0),
        }
    }

    /// Publishes a new observation. Returns `true` if it differs from the last.
    pub fn store(&self, snapshot: SelectorSnapshot) -> bool {
        let word = snapshot.pack();
        self.word.swap(word, Ordering::AcqRel) != word
    }

    /// Copies out the most recent observation.
    pub fn snapshot(&self) -> SelectorSnapshot {
        SelectorSnapshot::unpack(self.word.load(Ordering::Acquire))
    }
}

impl Default for SelectorDigits {
    fn default() -> Self {
        Self::new()
    }
}

/// The nine selector input pins, each digit MSB first.
///
/// A switch reads high when its bit is set.
pub struct SelectorPins<P> {
    pub hundreds: [P; HUNDREDS_WIDTH],
    pub tens: [P; TENS_WIDTH],
    pub units: [P; UNITS_WIDTH],
}

impl<P: InputPin> SelectorPins<P> {
    /// Groups the selector inputs by digit.
    ///
    /// # Arguments
    ///
    /// * `hundreds` - Hundreds selector bit
    /// * `tens` - Tens selector bits, MSB first
    /// * `units` - Units selector bits, MSB first
    pub fn new(
        hundreds: [P; HUNDREDS_WIDTH],
        tens: [P; TENS_WIDTH],
        units: [P; UNITS_WIDTH],
    ) -> Self {
        Self {
            hundreds,
            tens,
            units,
        }
    }

    /// Reads every pin. A pin that fails to read counts as low.
    pub fn sample(&self) -> SelectorSnapshot {
        SelectorSnapshot {
            hundreds: read_digit(&self.hundreds),
            tens: read_digit(&self.tens),
            units: read_digit(&self.units),
        }
    }
}

fn read_digit<P: InputPin, const N: usize>(pins: &[P; N]) -> [bool; N] {
    let mut bits = [false; N];
    for (bit, pin) in bits.iter_mut().zip(pins) {
        *bit = pin.is_high().unwrap_or(false);
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn test_compose_accepts_valid_bcd() {
        assert_eq!(compose(0, 5, 3), Ok(DutyCycle::new(53).unwrap()));
        assert_eq!(compose(0, 9, 9), Ok(DutyCycle::new(99).unwrap()));
        assert_eq!(compose(1, 0, 0), Ok(DutyCycle::MAX));
        assert_eq!(compose(0, 0, 0), Ok(DutyCycle::ZERO));
    }

    #[test]
    fn test_compose_rejects_above_hundred() {
        assert_eq!(compose(1, 0, 1), Err(ControlError::InvalidBcdEncoding));
        assert_eq!(compose(1, 5, 0), Err(ControlError::InvalidBcdEncoding));
    }

    #[test]
    fn test_compose_rejects_non_decimal_digits() {
        // 10 tens would still be 100 arithmetically
        assert_eq!(compose(0, 10, 0), Err(ControlError::InvalidBcdEncoding));
        assert_eq!(compose(0, 0, 12), Err(ControlError::InvalidBcdEncoding));
        assert_eq!(compose(0, 15, 15), Err(ControlError::InvalidBcdEncoding));
    }

    #[test]
    fn test_snapshot_compose_goes_through_decoder() {
        let snapshot = SelectorSnapshot {
            hundreds: [false],
            tens: [false, true, false, true],
            units: [false, false, true, true],
        };
        assert_eq!(snapshot.digits(), (0, 5, 3));
        assert_eq!(snapshot.compose(), Ok(DutyCycle::new(53).unwrap()));
    }

    #[test]
    fn test_shared_digits_store_and_copy() {
        let digits = SelectorDigits::new();
        assert_eq!(digits.snapshot(), SelectorSnapshot::default());

        let snapshot = SelectorSnapshot::from_digits(1, 15, 9);
        assert!(digits.store(snapshot));
        assert!(!digits.store(snapshot));

        let copy = digits.snapshot();
        digits.store(SelectorSnapshot::from_digits(0, 0, 1));
        assert_eq!(copy, snapshot);
        assert_eq!(copy.digits(), (1, 15, 9));
    }

    #[test]
    fn test_sample_reads_pins_msb_first() {
        let pins = SelectorPins::new(
            [MockPin::low()],
            [MockPin::low(), MockPin::high(), MockPin::high(), MockPin::high()],
            [MockPin::high(), MockPin::low(), MockPin::low(), MockPin::low()],
        );
        let snapshot = pins.sample();
        assert_eq!(snapshot.digits(), (0, 7, 8));
        assert_eq!(snapshot.compose(), Ok(DutyCycle::new(78).unwrap()));
    }
}
