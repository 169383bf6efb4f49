//! Input state machine.
//!
//! ```text
//!            up/down                      inizio
//! TerminalIdle ──────► ApplyingTerminalEdit   SelectorIdle ──────► ApplyingSelectorEdit
//!      ▲                      │                    ▲                       │
//!      └──────────────────────┘                    └───────────────────────┘
//!                                                         fine / anything else
//!
//!        toggle: any state ──► idle state of the new authority
//! ```
//!
//! Each state has one handler that performs at most one line read and
//! returns the next state. Every read races the authority flip event, so a
//! toggle redirects the loop without waiting for more input.
//!
//! Every accepted or rejected command produces exactly one status line
//! ([`Outcome`]). Empty lines are ignored.

use core::fmt::Write as _;

use embassy_futures::select::{Either, select};
use embedded_io_async::{Read, Write};
use heapless::String;

use crate::authority::{Arbiter, AuthoritySource};
use crate::config::{
    INITIAL_DUTY_PERCENT, STATUS_LINE_LEN, TOKEN_BEGIN, TOKEN_COMMIT, TOKEN_DOWN, TOKEN_UP,
};
use crate::duty::{DutyCycle, DutyCycleMapper, PwmOutput};
use crate::error::ControlError;
use crate::line::{Line, LineChannel};
use crate::selector::SelectorDigits;

const BANNER: &[&str] = &[
    "PWM motor speed controller",
    "~~~~~~~~~~~~~~~~~ Welcome! ~~~~~~~~~~~~~~~~~",
    "The duty cycle can be changed in two ways:",
    "- type \"up\" to raise the duty cycle by 1%",
    "  type \"down\" to lower the duty cycle by 1%",
    "- press the mode button to switch to the BCD selectors",
    "  (one selector per decimal digit)",
];

const TERMINAL_PROMPT: &[&str] = &[
    "",
    "Type \"up\" to raise the duty cycle by 1%",
    "Type \"down\" to lower the duty cycle by 1%",
];

const SELECTOR_INSTRUCTIONS: &[&str] = &[
    "~~~~~~~ Selector input ~~~~~~~",
    "From left to right the selectors set hundreds, tens and units.",
    "Each selector uses BCD encoding (0-9).",
    "- type \"inizio\" before changing the selectors",
    "- type \"fine\" once the selectors are set",
    "The duty cycle ranges from 0% to 100% in 1% steps.",
];

const EDIT_PROMPT: &[&str] = &["", "Type \"fine\" when the selectors are set"];

/// Terminal edit requested in [`ControlState::TerminalIdle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TerminalCommand {
    Up,
    Down,
}

/// State of the input loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlState {
    /// Waiting for `up` / `down`
    #[default]
    TerminalIdle,
    /// Waiting for the begin token
    SelectorIdle,
    /// Applying a terminal command
    ApplyingTerminalEdit(TerminalCommand),
    /// Edit window open, waiting for the commit token
    ApplyingSelectorEdit,
}

impl ControlState {
    /// Idle state owned by `source`.
    pub const fn idle_for(source: AuthoritySource) -> Self {
        match source {
            AuthoritySource::Terminal => Self::TerminalIdle,
            AuthoritySource::Selector => Self::SelectorIdle,
        }
    }

    /// Source this state belongs to.
    pub const fn source(self) -> AuthoritySource {
        match self {
            Self::TerminalIdle | Self::ApplyingTerminalEdit(_) => AuthoritySource::Terminal,
            Self::SelectorIdle | Self::ApplyingSelectorEdit => AuthoritySource::Selector,
        }
    }
}

/// Result of one command, reported as a single status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    DutyCycleSet(DutyCycle),
    DutyCycleAtMaximum,
    MotorStopped,
    Rejected(ControlError),
}

impl Outcome {
    /// Status line sent to the terminal for this outcome.
    pub fn render(&self) -> String<STATUS_LINE_LEN> {
        let mut line = String::new();
        // Longest message fits STATUS_LINE_LEN
        let _ = match self {
            Self::DutyCycleSet(duty) => write!(line, "-> Duty cycle set to {}", duty),
            Self::DutyCycleAtMaximum => line.write_str("-> Duty cycle already at 100%"),
            Self::MotorStopped => line.write_str("-> Motor stopped (duty cycle 0%)"),
            Self::Rejected(error) => write!(line, "-> {}", error),
        };
        line
    }
}

/// Recognised protocol tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Up,
    Down,
    Begin,
    Commit,
    Empty,
    Other,
}

impl Token {
    fn parse(line: &Line) -> Self {
        match line.as_bytes() {
            _ if line.is_empty() => Self::Empty,
            t if t == TOKEN_UP => Self::Up,
            t if t == TOKEN_DOWN => Self::Down,
            t if t == TOKEN_BEGIN => Self::Begin,
            t if t == TOKEN_COMMIT => Self::Commit,
            _ => Self::Other,
        }
    }
}

/// What a read produced.
enum Input {
    Line(Line),
    Flipped(AuthoritySource),
    Fault,
}

/// Drives the duty cycle from terminal lines and selector commits.
pub struct SpeedController<'a, T, P> {
    channel: LineChannel<T>,
    mapper: DutyCycleMapper<P>,
    arbiter: &'a Arbiter,
    selector: &'a SelectorDigits,
    state: ControlState,
    duty: DutyCycle,
}

impl<'a, T, P> SpeedController<'a, T, P>
where
    T: Read + Write,
    P: PwmOutput,
{
    /// Creates the controller and brings the output to the initial duty cycle.
    ///
    /// # Arguments
    ///
    /// * `io` - Terminal transport
    /// * `output` - PWM stage, halted until the first non-zero duty cycle
    /// * `arbiter` - Authority shared with the toggle task
    /// * `selector` - Selector digits shared with the sampling task
    pub fn new(io: T, output: P, arbiter: &'a Arbiter, selector: &'a SelectorDigits) -> Self {
        let duty = DutyCycle::new(INITIAL_DUTY_PERCENT).unwrap_or(DutyCycle::ZERO);
        let mut mapper = DutyCycleMapper::new(output);
        if !duty.is_zero() {
            mapper.power_up(duty);
        }

        Self {
            channel: LineChannel::new(io),
            mapper,
            arbiter,
            selector,
            state: ControlState::idle_for(arbiter.authority()),
            duty,
        }
    }

    /// State the next [`step`](Self::step) will run.
    pub fn state(&self) -> ControlState {
        self.state
    }

    /// Duty cycle currently applied to the output.
    pub fn duty(&self) -> DutyCycle {
        self.duty
    }

    /// `true` while the output stage is powered down.
    ///
    /// Only ever true at 0%; an `up` in this state restarts at 1%.
    pub fn motor_stopped(&self) -> bool {
        !self.mapper.is_running()
    }

    /// Output mapper, for inspecting the PWM stage.
    pub fn mapper(&self) -> &DutyCycleMapper<P> {
        &self.mapper
    }

    /// Underlying transport.
    pub fn transport(&mut self) -> &mut T {
        self.channel.transport()
    }

    /// Sends the banner and runs the loop forever.
    pub async fn run(&mut self) -> ! {
        self.send_banner().await;
        loop {
            self.step().await;
        }
    }

    /// Sends the startup banner.
    pub async fn send_banner(&mut self) {
        self.send_lines(BANNER).await;
    }

    /// Runs one state handler.
    pub async fn step(&mut self) {
        if let Some(source) = self.arbiter.take_flip() {
            self.state = self.on_flip(source).await;
            return;
        }

        let authority = self.arbiter.authority();
        if self.state.source() != authority {
            log_debug!("State belongs to the other source, redirecting");
            self.state = ControlState::idle_for(authority);
            return;
        }

        self.state = match self.state {
            ControlState::TerminalIdle => self.terminal_idle().await,
            ControlState::ApplyingTerminalEdit(command) => self.apply_terminal_edit(command).await,
            ControlState::SelectorIdle => self.selector_idle().await,
            ControlState::ApplyingSelectorEdit => self.apply_selector_edit().await,
        };
    }

    async fn terminal_idle(&mut self) -> ControlState {
        self.send_lines(TERMINAL_PROMPT).await;

        let line = match self.read_input().await {
            Input::Line(line) => line,
            Input::Flipped(source) => return self.on_flip(source).await,
            Input::Fault => return ControlState::TerminalIdle,
        };
        if let Some(state) = self.lost_authority(AuthoritySource::Terminal) {
            return state;
        }

        match Token::parse(&line) {
            Token::Up => ControlState::ApplyingTerminalEdit(TerminalCommand::Up),
            Token::Down => ControlState::ApplyingTerminalEdit(TerminalCommand::Down),
            Token::Empty => ControlState::TerminalIdle,
            _ => {
                log_debug!("Unrecognised terminal input: {}", line.as_str());
                self.report(Outcome::Rejected(ControlError::CommandNotRecognized))
                    .await;
                ControlState::TerminalIdle
            }
        }
    }

    async fn apply_terminal_edit(&mut self, command: TerminalCommand) -> ControlState {
        let outcome = match command {
            TerminalCommand::Up => self.step_up(),
            TerminalCommand::Down => self.step_down(),
        };
        self.report(outcome).await;
        ControlState::TerminalIdle
    }

    async fn selector_idle(&mut self) -> ControlState {
        self.send_lines(SELECTOR_INSTRUCTIONS).await;

        let line = match self.read_input().await {
            Input::Line(line) => line,
            Input::Flipped(source) => return self.on_flip(source).await,
            Input::Fault => return ControlState::SelectorIdle,
        };
        if let Some(state) = self.lost_authority(AuthoritySource::Selector) {
            return state;
        }

        match Token::parse(&line) {
            Token::Begin => ControlState::ApplyingSelectorEdit,
            Token::Empty => ControlState::SelectorIdle,
            _ => {
                self.report(Outcome::Rejected(ControlError::MustBeginFirst))
                    .await;
                ControlState::SelectorIdle
            }
        }
    }

    async fn apply_selector_edit(&mut self) -> ControlState {
        self.send_lines(EDIT_PROMPT).await;

        let line = match self.read_input().await {
            Input::Line(line) => line,
            Input::Flipped(source) => return self.on_flip(source).await,
            Input::Fault => return ControlState::ApplyingSelectorEdit,
        };
        if let Some(state) = self.lost_authority(AuthoritySource::Selector) {
            return state;
        }

        let outcome = match Token::parse(&line) {
            Token::Commit => self.commit_selector(),
            Token::Empty => return ControlState::ApplyingSelectorEdit,
            _ => Outcome::Rejected(ControlError::EditNotApplied),
        };
        self.report(outcome).await;
        ControlState::SelectorIdle
    }

    fn step_up(&mut self) -> Outcome {
        if self.motor_stopped() {
            self.start_motor(DutyCycle::MIN_RUNNING);
            return Outcome::DutyCycleSet(self.duty);
        }

        match self.duty.increment() {
            Some(duty) => {
                self.duty = duty;
                self.mapper.apply(duty);
                Outcome::DutyCycleSet(duty)
            }
            None => Outcome::DutyCycleAtMaximum,
        }
    }

    fn step_down(&mut self) -> Outcome {
        match self.duty.decrement() {
            Some(duty) if !duty.is_zero() => {
                self.duty = duty;
                self.mapper.apply(duty);
                Outcome::DutyCycleSet(duty)
            }
            _ => {
                self.stop_motor();
                Outcome::MotorStopped
            }
        }
    }

    /// Applies the selector value observed now.
    fn commit_selector(&mut self) -> Outcome {
        let snapshot = self.selector.snapshot();
        let (hundreds, tens, units) = snapshot.digits();
        log_debug!("Selector commit: {} {} {}", hundreds, tens, units);

        match snapshot.compose() {
            Err(error) => {
                log_warn!("Selector value rejected: {}", error);
                Outcome::Rejected(error)
            }
            Ok(duty) if duty.is_zero() => {
                self.stop_motor();
                Outcome::MotorStopped
            }
            Ok(duty) if self.motor_stopped() => {
                self.start_motor(duty);
                Outcome::DutyCycleSet(duty)
            }
            Ok(duty) => {
                self.duty = duty;
                self.mapper.apply(duty);
                Outcome::DutyCycleSet(duty)
            }
        }
    }

    fn start_motor(&mut self, duty: DutyCycle) {
        self.mapper.power_up(duty);
        self.duty = duty;
    }

    fn stop_motor(&mut self) {
        self.duty = DutyCycle::ZERO;
        self.mapper.power_down();
    }

    /// Announces a flip and returns the new source's idle state.
    async fn on_flip(&mut self, source: AuthoritySource) -> ControlState {
        self.channel.discard_partial();
        self.send_line(source.announcement()).await;
        ControlState::idle_for(source)
    }

    /// Checks authority after a line arrived; the line is dropped if it moved.
    fn lost_authority(&mut self, expected: AuthoritySource) -> Option<ControlState> {
        let authority = self.arbiter.authority();
        if authority == expected {
            None
        } else {
            log_debug!("Authority moved to {} during read", authority);
            Some(ControlState::idle_for(authority))
        }
    }

    async fn read_input(&mut self) -> Input {
        let arbiter = self.arbiter;
        match select(self.channel.read_line(), arbiter.wait_flip()).await {
            Either::First(Ok(line)) => Input::Line(line),
            Either::First(Err(error)) => {
                log_warn!("Terminal read failed: {}", error);
                Input::Fault
            }
            Either::Second(source) => Input::Flipped(source),
        }
    }

    async fn report(&mut self, outcome: Outcome) {
        let line = outcome.render();
        log_info!("{}", line.as_str());
        self.send_line(&line).await;
    }

    async fn send_lines(&mut self, lines: &[&str]) {
        for line in lines {
            self.send_line(line).await;
        }
    }

    async fn send_line(&mut self, text: &str) {
        if let Err(error) = self.channel.write_line(text).await {
            log_warn!("Terminal write failed: {}", error);
        }
    }
}
