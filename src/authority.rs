//! Arbitration between the terminal and the selectors.
//!
//! A toggle button decides which source may change the duty cycle. Each
//! accepted falling edge flips the authority, updates the status indicator
//! and raises a flip event. The controller consumes the event to drop
//! whatever it was waiting for and move to the new source's idle state.
//!
//! # Concurrency
//!
//! [`Arbiter::on_toggle_edge`] runs in the toggle task, concurrently with the
//! controller. The authority is a single atomic flag and the event is an
//! interrupt-safe [`Signal`], so neither side ever blocks the other.

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embedded_hal::digital::v2::OutputPin;
use portable_atomic::{AtomicBool, Ordering};

/// Input source currently allowed to change the duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthoritySource {
    /// Serial terminal (`up` / `down`)
    #[default]
    Terminal,
    /// BCD digit selectors
    Selector,
}

impl AuthoritySource {
    /// Line sent to the operator when this source takes over.
    pub const fn announcement(self) -> &'static str {
        match self {
            Self::Terminal => "Terminal input is now active",
            Self::Selector => "Selector input is now active",
        }
    }
}

impl fmt::Display for AuthoritySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal => f.write_str("terminal"),
            Self::Selector => f.write_str("selector"),
        }
    }
}

/// Status light showing the current authority.
pub trait StatusIndicator {
    fn set_on(&mut self, on: bool);
}

impl<T: OutputPin> StatusIndicator for T {
    fn set_on(&mut self, on: bool) {
        let result = if on { self.set_high() } else { self.set_low() };
        if result.is_err() {
            log_warn!("Status indicator did not respond");
        }
    }
}

/// Shared authority flag plus its flip event.
pub struct Arbiter {
    selector_active: AtomicBool,
    flips: Signal<CriticalSectionRawMutex, AuthoritySource>,
}

impl Arbiter {
    /// Terminal has authority at startup.
    pub const fn new() -> Self {
        Self {
            selector_active: AtomicBool::new(false),
            flips: Signal::new(),
        }
    }

    /// Source that currently has authority.
    pub fn authority(&self) -> AuthoritySource {
        if self.selector_active.load(Ordering::Acquire) {
            AuthoritySource::Selector
        } else {
            AuthoritySource::Terminal
        }
    }

    /// Handles one accepted toggle edge and returns the new authority.
    ///
    /// The indicator is on while the terminal has authority.
    pub fn on_toggle_edge<I: StatusIndicator>(&self, indicator: &mut I) -> AuthoritySource {
        let was_selector = self.selector_active.fetch_xor(true, Ordering::AcqRel);
        let source = if was_selector {
            AuthoritySource::Terminal
        } else {
            AuthoritySource::Selector
        };

        indicator.set_on(source == AuthoritySource::Terminal);
        log_info!("{}", source.announcement());
        self.flips.signal(source);
        source
    }

    /// Takes a pending flip event without waiting.
    pub fn take_flip(&self) -> Option<AuthoritySource> {
        self.flips.try_take()
    }

    /// Waits for the next flip event.
    pub async fn wait_flip(&self) -> AuthoritySource {
        self.flips.wait().await
    }
}

impl Default for Arbiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Debounces the active-low toggle button.
///
/// A press is accepted only after the contacts have been quiet for the
/// hold-off window. The window restarts at every accepted press and again
/// when the button is released, so release bounce never reads as a press
/// however long the button was held.
#[derive(Debug, Clone, Copy)]
pub struct EdgeGate {
    holdoff_ms: u64,
    quiet_since_ms: Option<u64>,
}

impl EdgeGate {
    /// Creates a gate that accepts the first press immediately.
    ///
    /// # Arguments
    ///
    /// * `holdoff_ms` - Quiet time required before the next press counts
    pub const fn new(holdoff_ms: u64) -> Self {
        Self {
            holdoff_ms,
            quiet_since_ms: None,
        }
    }

    /// Returns `true` if a falling edge at `now_ms` should be acted on.
    pub fn accept(&mut self, now_ms: u64) -> bool {
        match self.quiet_since_ms {
            Some(since) if now_ms.saturating_sub(since) < self.holdoff_ms => false,
            _ => {
                self.quiet_since_ms = Some(now_ms);
                true
            }
        }
    }

    /// Records the button going back high at `now_ms`.
    pub fn release(&mut self, now_ms: u64) {
        let since = self.quiet_since_ms.map_or(now_ms, |since| since.max(now_ms));
        self.quiet_since_ms = Some(since);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLed;

    #[test]
    fn test_terminal_is_initial_authority() {
        let arbiter = Arbiter::new();
        assert_eq!(arbiter.authority(), AuthoritySource::Terminal);
        assert_eq!(arbiter.take_flip(), None);
    }

    #[test]
    fn test_toggle_flips_authority_and_indicator() {
        let arbiter = Arbiter::new();
        let mut led = MockLed::on();

        assert_eq!(arbiter.on_toggle_edge(&mut led), AuthoritySource::Selector);
        assert_eq!(arbiter.authority(), AuthoritySource::Selector);
        assert!(!led.is_on);

        assert_eq!(arbiter.on_toggle_edge(&mut led), AuthoritySource::Terminal);
        assert_eq!(arbiter.authority(), AuthoritySource::Terminal);
        assert!(led.is_on);
    }

    #[test]
    fn test_flip_event_is_consumed_once() {
        let arbiter = Arbiter::new();
        let mut led = MockLed::on();

        arbiter.on_toggle_edge(&mut led);
        assert_eq!(arbiter.take_flip(), Some(AuthoritySource::Selector));
        assert_eq!(arbiter.take_flip(), None);
    }

    #[test]
    fn test_pending_flip_holds_latest_source() {
        let arbiter = Arbiter::new();
        let mut led = MockLed::on();

        arbiter.on_toggle_edge(&mut led);
        arbiter.on_toggle_edge(&mut led);
        assert_eq!(arbiter.take_flip(), Some(AuthoritySource::Terminal));
    }

    #[test]
    fn test_wait_flip_returns_signalled_source() {
        let arbiter = Arbiter::new();
        let mut led = MockLed::on();

        arbiter.on_toggle_edge(&mut led);
        let source = embassy_futures::block_on(arbiter.wait_flip());
        assert_eq!(source, AuthoritySource::Selector);
    }

    #[test]
    fn test_edge_gate_holdoff() {
        let mut gate = EdgeGate::new(100);
        assert!(gate.accept(1_000));
        assert!(!gate.accept(1_050));
        assert!(!gate.accept(1_099));
        assert!(gate.accept(1_100));
        // Rejected edges do not extend the window
        assert!(!gate.accept(1_150));
        assert!(gate.accept(1_200));
    }

    #[test]
    fn test_edge_gate_ignores_release_bounce_after_long_press() {
        let mut gate = EdgeGate::new(100);
        assert!(gate.accept(1_000));
        // Held well past the hold-off, then released with bounce
        gate.release(1_500);
        assert!(!gate.accept(1_502));
        gate.release(1_504);
        assert!(!gate.accept(1_550));
        // Next real press
        assert!(gate.accept(1_700));
    }

    #[test]
    fn test_edge_gate_release_never_moves_window_back() {
        let mut gate = EdgeGate::new(100);
        assert!(gate.accept(1_000));
        gate.release(900);
        assert!(!gate.accept(1_050));
        assert!(gate.accept(1_100));
    }

    #[test]
    fn test_edge_gate_first_edge_at_boot() {
        let mut gate = EdgeGate::new(100);
        assert!(gate.accept(0));
        assert!(!gate.accept(10));
    }
}
