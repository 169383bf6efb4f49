//! Duty-cycle type and its mapping onto the PWM output.
//!
//! The output peripheral counts from 0 to a fixed ceiling (`top`) and drives
//! the pin high while the counter is below the compare value. The mapper
//! converts a percentage into that compare value and owns the output's
//! power state.
//!
//! # Power states
//!
//! - **Running**: counter enabled, compare value tracks the duty cycle
//! - **Halted**: counter stopped and reset, pending events cleared
//!
//! Leaving the halted state always writes a compare value first, so the
//! output never restarts with a stale one.

use core::fmt;

/// Integer duty cycle in percent, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyCycle(u8);

impl DutyCycle {
    /// Output off
    pub const ZERO: Self = Self(0);
    /// Lowest running duty cycle
    pub const MIN_RUNNING: Self = Self(1);
    /// Output permanently high
    pub const MAX: Self = Self(100);

    /// Returns `None` for values above 100.
    pub const fn new(percent: u8) -> Option<Self> {
        if percent <= Self::MAX.0 {
            Some(Self(percent))
        } else {
            None
        }
    }

    /// Value in percent.
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// `true` at 0%.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// One percent more, or `None` at 100%.
    pub const fn increment(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// One percent less, or `None` at 0%.
    pub const fn decrement(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(percent) => Some(Self(percent)),
            None => None,
        }
    }
}

impl fmt::Display for DutyCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Compare register value for `duty` on a counter that tops out at `top`.
///
/// Rounds up, so 0% is exactly 0 and 100% is exactly `top`.
pub const fn compare_value(duty: DutyCycle, top: u16) -> u16 {
    let scaled = duty.0 as u32 * top as u32;
    scaled.div_ceil(100) as u16
}

/// PWM output stage driven by the mapper.
pub trait PwmOutput {
    /// Counter ceiling; a compare value equal to it keeps the pin high.
    fn max_compare(&self) -> u16;

    /// Writes the compare register.
    fn set_compare(&mut self, value: u16);

    /// Stops the counter, resets it to zero and clears pending compare/update
    /// flags. Must not be interruptible part-way through.
    fn halt(&mut self);

    /// Restarts the counter from the current compare value.
    fn resume(&mut self);
}

/// Maps duty cycles onto a [`PwmOutput`] and tracks whether it is running.
pub struct DutyCycleMapper<P> {
    output: P,
    running: bool,
}

impl<P: PwmOutput> DutyCycleMapper<P> {
    /// Takes ownership of `output` and halts it until the first power-up.
    pub fn new(mut output: P) -> Self {
        output.set_compare(0);
        output.halt();
        Self {
            output,
            running: false,
        }
    }

    /// `false` from construction or power-down until the next power-up.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The driven output stage.
    pub fn output(&self) -> &P {
        &self.output
    }

    /// Compare value `duty` maps to on this output.
    pub fn compare_for(&self, duty: DutyCycle) -> u16 {
        compare_value(duty, self.output.max_compare())
    }

    /// Updates the compare register of a running output.
    pub fn apply(&mut self, duty: DutyCycle) {
        let value = self.compare_for(duty);
        log_debug!("duty {} -> compare {}", duty.percent(), value);
        self.output.set_compare(value);
    }

    /// Stops the output stage.
    pub fn power_down(&mut self) {
        self.output.halt();
        self.output.set_compare(0);
        self.running = false;
        log_info!("Output stage powered down");
    }

    /// Re-arms the output stage at `duty`.
    ///
    /// The compare register is written before the counter restarts.
    pub fn power_up(&mut self, duty: DutyCycle) {
        self.apply(duty);
        self.output.resume();
        self.running = true;
        log_info!("Output stage powered up at {}%", duty.percent());
    }
}
