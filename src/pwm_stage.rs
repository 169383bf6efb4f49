//! Motor PWM output stage on TIM2 channel 1.
//!
//! Duty updates go through the embassy `SimplePwm` driver. Powering down
//! also needs the counter reset and the pending flags cleared, which the
//! driver does not expose, so those steps write the TIM2 registers through
//! the PAC.
//!
//! # Power-down sequence
//!
//! The whole sequence runs with interrupts masked so no handler can observe
//! the timer half stopped:
//! 1. Disable the channel output
//! 2. Stop the counter (CR1.CEN)
//! 3. Reset the counter (CNT = 0)
//! 4. Clear update and capture/compare flags in SR

use embassy_stm32::pac;
use embassy_stm32::peripherals::TIM2;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use motor_pwm::PwmOutput;

/// TIM2 channel driving the motor.
pub struct PwmStage<'d> {
    pwm: SimplePwm<'d, TIM2>,
}

impl<'d> PwmStage<'d> {
    /// Wraps a configured `SimplePwm`.
    ///
    /// The stage stays halted until the controller powers it up.
    pub fn new(pwm: SimplePwm<'d, TIM2>) -> Self {
        Self { pwm }
    }
}

impl PwmOutput for PwmStage<'_> {
    fn max_compare(&self) -> u16 {
        self.pwm.max_duty_cycle()
    }

    fn set_compare(&mut self, value: u16) {
        self.pwm.ch1().set_duty_cycle(value);
    }

    fn halt(&mut self) {
        cortex_m::interrupt::free(|_| {
            self.pwm.ch1().disable();

            let tim = pac::TIM2;
            tim.cr1().modify(|w| w.set_cen(false));
            tim.cnt().write(|w| w.set_cnt(0));
            tim.sr().modify(|w| {
                w.set_uif(false);
                w.set_ccif(0, false);
            });
        });

        #[cfg(feature = "debug-mode")]
        defmt::info!("TIM2 halted");
    }

    fn resume(&mut self) {
        self.pwm.ch1().enable();
        pac::TIM2.cr1().modify(|w| w.set_cen(true));

        #[cfg(feature = "debug-mode")]
        defmt::info!("TIM2 running");
    }
}
