//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and peripheral initialization
//! for the motor-speed controller board.
//!
//! # Pin Assignments
//!
//! ## Terminal (USART2, 9600 8N1)
//! - **PA2**: TX
//! - **PA3**: RX
//!
//! ## Motor Output
//! - **PA5**: TIM2_CH1 - PWM to the motor driver
//!
//! ## Authority Toggle & Indicator
//! - **PB7**: MODE_N - Active-low push button (EXTI7, internal pull-up)
//! - **PB3**: LED - On while the terminal has authority
//!
//! ## BCD Selectors (MSB first, switch closed = high)
//! - **PB0**: Hundreds
//! - **PA7, PA8, PA9, PA10**: Tens
//! - **PA0, PA1, PA4, PA6**: Units
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK

use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, OutputType, Pull, Speed};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{self, BufferedUart};
use embassy_stm32::{bind_interrupts, peripherals};
use motor_pwm::SelectorPins;
use motor_pwm::config::{BAUD_RATE, PWM_FREQUENCY_HZ};
use static_cell::StaticCell;

use crate::pwm_stage::PwmStage;

bind_interrupts!(struct Irqs {
    USART2 => usart::BufferedInterruptHandler<peripherals::USART2>;
});

/// UART transmit ring size
const TX_BUFFER_SIZE: usize = 256;

/// UART receive ring size (several full command lines)
const RX_BUFFER_SIZE: usize = 128;

static TX_BUFFER: StaticCell<[u8; TX_BUFFER_SIZE]> = StaticCell::new();
static RX_BUFFER: StaticCell<[u8; RX_BUFFER_SIZE]> = StaticCell::new();

/// Top-level peripheral container for the controller board.
///
/// Owns every collaborator of the control loop and is split up
/// between the tasks in `main`.
pub struct Peripherals {
    /// Terminal line
    pub uart: BufferedUart<'static>,
    /// Motor PWM output stage
    pub pwm: PwmStage<'static>,
    /// Authority toggle button (active-low)
    pub toggle: ExtiInput<'static>,
    /// Authority indicator LED
    pub indicator: Output<'static>,
    /// BCD selector inputs
    pub selector: SelectorPins<Input<'static>>,
}

impl Peripherals {
    /// Initializes all peripherals from STM32 peripheral singleton.
    ///
    /// # Initial States
    ///
    /// - PB3 (LED): High, the terminal starts with authority
    /// - TIM2_CH1: halted with a zero compare value until the first command
    /// - Selector inputs: pull-down, an open switch reads as 0
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    pub fn new(p: embassy_stm32::Peripherals) -> Self {
        let mut uart_config = usart::Config::default();
        uart_config.baudrate = BAUD_RATE;

        let uart = BufferedUart::new(
            p.USART2,
            p.PA3,
            p.PA2,
            TX_BUFFER.init([0; TX_BUFFER_SIZE]),
            RX_BUFFER.init([0; RX_BUFFER_SIZE]),
            Irqs,
            uart_config,
        )
        .unwrap();

        let pwm = SimplePwm::new(
            p.TIM2,
            Some(PwmPin::new(p.PA5, OutputType::PushPull)),
            None,
            None,
            None,
            Hertz::hz(PWM_FREQUENCY_HZ),
            CountingMode::EdgeAlignedUp,
        );

        Self {
            uart,
            pwm: PwmStage::new(pwm),
            toggle: ExtiInput::new(p.PB7, p.EXTI7, Pull::Up),
            indicator: Output::new(p.PB3, Level::High, Speed::Low),
            selector: SelectorPins::new(
                [Input::new(p.PB0, Pull::Down)],
                [
                    Input::new(p.PA7, Pull::Down),
                    Input::new(p.PA8, Pull::Down),
                    Input::new(p.PA9, Pull::Down),
                    Input::new(p.PA10, Pull::Down),
                ],
                [
                    Input::new(p.PA0, Pull::Down),
                    Input::new(p.PA1, Pull::Down),
                    Input::new(p.PA4, Pull::Down),
                    Input::new(p.PA6, Pull::Down),
                ],
            ),
        }
    }
}
