//! Tasks watching the operator inputs.
//!
//! Both tasks only publish into shared state owned by `main`:
//! - the toggle task flips the [`Arbiter`] and drives the status LED,
//! - the selector task keeps [`SelectorDigits`] equal to the switch positions.
//!
//! Neither blocks the control loop. The control loop picks the changes up
//! through the arbiter's flip event and by copying the selector digits when
//! an edit is committed.

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Output};
use embassy_time::{Duration, Instant, Ticker};
use motor_pwm::config::{SELECTOR_POLL_MS, TOGGLE_HOLDOFF_MS};
use motor_pwm::{Arbiter, EdgeGate, SelectorDigits, SelectorPins};

/// Async task for the authority toggle button.
///
/// Waits for falling edges on the active-low button and flips authority
/// for each press that clears the hold-off window. After each press the
/// task waits for the button to read high again and restarts the window
/// there, so bounce on release is ignored.
///
/// # Arguments
///
/// * `button` - EXTI-capable input for the toggle (PB7)
/// * `indicator` - Status LED, on while the terminal has authority (PB3)
/// * `arbiter` - Shared authority state
#[embassy_executor::task]
pub async fn toggle_task(
    mut button: ExtiInput<'static>,
    mut indicator: Output<'static>,
    arbiter: &'static Arbiter,
) {
    let mut gate = EdgeGate::new(TOGGLE_HOLDOFF_MS);

    loop {
        button.wait_for_falling_edge().await;

        if gate.accept(Instant::now().as_millis()) {
            let source = arbiter.on_toggle_edge(&mut indicator);
            defmt::debug!("Authority now {}", source);
        }

        button.wait_for_high().await;
        gate.release(Instant::now().as_millis());
    }
}

/// Async task sampling the BCD selector switches.
///
/// Polls all nine inputs every `SELECTOR_POLL_MS` and publishes the result
/// as one packed word, so readers always see a complete observation.
///
/// # Arguments
///
/// * `pins` - Selector inputs, each digit MSB first
/// * `digits` - Shared selector state read by the controller
#[embassy_executor::task]
pub async fn selector_task(pins: SelectorPins<Input<'static>>, digits: &'static SelectorDigits) {
    let mut ticker = Ticker::every(Duration::from_millis(SELECTOR_POLL_MS));

    loop {
        let snapshot = pins.sample();
        if digits.store(snapshot) {
            let (hundreds, tens, units) = snapshot.digits();
            defmt::debug!("Selectors: {} {} {}", hundreds, tens, units);
        }

        ticker.next().await;
    }
}
