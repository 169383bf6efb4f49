//! Input arbitration and duty-cycle engine for a PWM motor-speed controller.
//!
//! # Overview
//!
//! The motor speed is the duty cycle of a single PWM output, adjustable from
//! 0% to 100% in 1% steps from two mutually exclusive sources:
//! - a serial terminal (`up` / `down` commands),
//! - three BCD digit selectors (hundreds, tens, units), applied between an
//!   `inizio` / `fine` bracket typed on the terminal.
//!
//! A toggle button flips which source is authoritative. A status LED is on
//! while the terminal has authority.
//!
//! # Module Organization
//!
//! - [`bcd`] - binary digit decoding
//! - [`selector`] - selector digit storage, sampling and composition
//! - [`duty`] - duty-cycle type, compare mapping and output power control
//! - [`authority`] - toggle arbitration between terminal and selectors
//! - [`line`] - line framing over an async byte transport
//! - [`controller`] - the input state machine
//! - [`config`] - compile-time configuration
//! - [`error`] - error taxonomy
//!
//! Hardware is reached only through `embedded-io-async`, `embedded-hal` and
//! the [`duty::PwmOutput`] trait, so the whole engine runs under host tests.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod authority;
pub mod bcd;
pub mod config;
pub mod controller;
pub mod duty;
pub mod error;
pub mod line;
pub mod selector;

#[cfg(test)]
mod mock;

pub use authority::{Arbiter, AuthoritySource, EdgeGate, StatusIndicator};
pub use controller::{ControlState, Outcome, SpeedController, TerminalCommand};
pub use duty::{DutyCycle, DutyCycleMapper, PwmOutput};
pub use error::{ControlError, LinkError};
pub use selector::{SelectorDigits, SelectorPins, SelectorSnapshot};
