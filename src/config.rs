//! Compile-time configuration.
//!
//! Everything here is fixed at build time: the line protocol has no
//! negotiation and the duty cycle is not persisted.

/// Maximum characters kept per received line. Longer lines are truncated.
pub const MAX_LINE_LEN: usize = 60;

/// Capacity of a rendered outbound status line.
pub const STATUS_LINE_LEN: usize = 80;

/// Terminal baud rate (8 data bits, no parity, 1 stop bit).
pub const BAUD_RATE: u32 = 9600;

/// PWM carrier frequency in hertz.
pub const PWM_FREQUENCY_HZ: u32 = 1_000;

/// Duty cycle at power-on. Zero starts with the output stage powered down.
pub const INITIAL_DUTY_PERCENT: u8 = 0;

/// Minimum spacing between two accepted toggle edges.
pub const TOGGLE_HOLDOFF_MS: u64 = 100;

/// Period of the selector pin sampling loop.
pub const SELECTOR_POLL_MS: u64 = 5;

/// Terminal command: increase the duty cycle by 1%.
pub const TOKEN_UP: &[u8] = b"up";

/// Terminal command: decrease the duty cycle by 1%.
pub const TOKEN_DOWN: &[u8] = b"down";

/// Opens a selector edit window.
pub const TOKEN_BEGIN: &[u8] = b"inizio";

/// Closes the selector edit window and applies the selector value.
pub const TOKEN_COMMIT: &[u8] = b"fine";
