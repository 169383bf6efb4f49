//! Firmware for a PWM motor-speed controller.
//!
//! # Overview
//!
//! The motor speed follows the duty cycle of TIM2_CH1, adjustable from 0% to
//! 100% in 1% steps:
//! - remotely, with `up` / `down` typed on a 9600 baud serial terminal
//! - locally, with three BCD selectors (hundreds, tens, units) committed
//!   between `inizio` and `fine` on the terminal
//!
//! A push button switches between the two sources; the status LED is on
//! while the terminal has authority.
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+)
//! - **Terminal**: USART2 to a USB-serial bridge
//! - **Motor**: PWM into an external motor driver
//! - **Inputs**: mode push button, 9 selector switches
//!
//! # Tasks
//!
//! - main task: the input state machine ([`motor_pwm::SpeedController`])
//! - [`inputs::toggle_task`]: authority button and status LED
//! - [`inputs::selector_task`]: selector switch sampling
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings and peripheral initialization
//! - [`pwm_stage`] - TIM2 output stage with register-level power-down
//! - [`inputs`] - Toggle and selector tasks

#![no_std]
#![no_main]

mod hardware;
mod inputs;
mod pwm_stage;

use embassy_executor::Spawner;
use embassy_stm32::{Config, rcc::LsConfig};
use motor_pwm::{Arbiter, SelectorDigits, SpeedController};
use {defmt_rtt as _, panic_probe as _};

use hardware::Peripherals;
use inputs::{selector_task, toggle_task};

/// Authority shared between the toggle task and the control loop.
static ARBITER: Arbiter = Arbiter::new();

/// Selector positions shared between the sampling task and the control loop.
static SELECTOR: SelectorDigits = SelectorDigits::new();

/// Creates the clock configuration for STM32L031.
///
/// # Clock Settings
///
/// - **MSI**: 2.097 MHz in normal mode, 4.194 MHz in debug mode (keeps the
///   debug connection responsive)
/// - **System clock**: MSI (no PLL)
/// - **Voltage scale**: Range 1
///
/// 2.097 MHz keeps the USART2 baud error at 9600 well under 1%.
///
/// # Returns
///
/// Configured RCC settings for embassy-stm32 initialization
fn create_clock_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        #[cfg(feature = "debug-mode")]
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE4M),
        #[cfg(not(feature = "debug-mode"))]
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE2M),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig::default(),
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: embassy_stm32::rcc::mux::ClockMux::default(),
    }
}

/// Main entry point for the motor-speed controller firmware.
///
/// # Initialization Sequence
///
/// 1. Configure clocks
/// 2. Initialize STM32 peripherals
/// 3. Spawn the toggle and selector tasks
/// 4. Build the controller (output halted at 0%) and send the banner
/// 5. Run the input state machine forever
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut config = Config::default();
    config.rcc = create_clock_config();

    let p = embassy_stm32::init(config);

    #[cfg(feature = "debug-mode")]
    {
        defmt::info!("Motor controller firmware starting...");

        // Leave time for a debugger to attach before the terminal starts.
        defmt::info!("Waiting 3 seconds for debugger connection...");
        embassy_time::Timer::after_secs(3).await;
    }

    let peripherals = Peripherals::new(p);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Spawning input tasks...");

    spawner
        .spawn(toggle_task(peripherals.toggle, peripherals.indicator, &ARBITER))
        .unwrap();
    spawner
        .spawn(selector_task(peripherals.selector, &SELECTOR))
        .unwrap();

    #[cfg(feature = "debug-mode")]
    defmt::info!("Entering control loop...");

    let mut controller =
        SpeedController::new(peripherals.uart, peripherals.pwm, &ARBITER, &SELECTOR);
    controller.run().await
}
