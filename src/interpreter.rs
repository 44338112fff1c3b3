//! The fetch-decode-execute loop.
//!
//! Each cycle the interpreter:
//! - polls the cancellation token and the optional wall-clock deadline,
//! - bumps the iteration counter and checks it against the cap,
//! - feeds the current state fingerprint to the loop heuristic,
//! - gives the debugger a chance to pause (debug runs only),
//! - executes exactly one instruction and advances the instruction pointer.
//!
//! A run always ends with a [`RunOutcome`] carrying whatever output was
//! produced, even when a guard or the user cut it short. Only a malformed
//! program or a failing input channel produce a [`RunError`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::debugger::{DebugMode, DebugSession, PauseOutcome, Snapshot};
use crate::guard::{Fingerprint, Limits, SafetyGuard, Verdict};
use crate::input::{InputSource, StdinSource};
use crate::program::{Instruction, Program, ProgramError};
use crate::tape::Tape;

/// Errors that stop a run from producing an outcome at all.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The source could not be turned into a program.
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Reading from the input channel failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io { ip: usize, #[source] source: std::io::Error },
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The instruction pointer ran past the end of the program.
    Completed,
    /// `q` at the debugger prompt.
    UserQuit,
    IterationLimitExceeded { limit: u64 },
    InfiniteLoopSuspected,
    /// The cancellation token was set.
    Interrupted,
    /// The wall-clock deadline passed.
    TimedOut { limit: Duration },
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::Completed => "completed",
            TerminationReason::UserQuit => "user-quit",
            TerminationReason::IterationLimitExceeded { .. } => "iteration-limit-exceeded",
            TerminationReason::InfiniteLoopSuspected => "infinite-loop-suspected",
            TerminationReason::Interrupted => "interrupted",
            TerminationReason::TimedOut { .. } => "timed-out",
        }
    }

    pub fn status(&self) -> RunStatus {
        match self {
            TerminationReason::Completed => RunStatus::Completed,
            _ => RunStatus::Terminated,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two-valued summary of a [`TerminationReason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Terminated,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Terminated => write!(f, "terminated"),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Bytes written by `.`, each mapped to the char with the same code
    /// (U+0000..=U+00FF).
    pub output: String,
    pub elapsed: Duration,
    pub iterations: u64,
    pub reason: TerminationReason,
}

impl RunOutcome {
    pub fn status(&self) -> RunStatus {
        self.reason.status()
    }

    pub fn execution_time_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Where the interpreter currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    PausedAtBreakpoint,
    Stepping,
    Terminated(TerminationReason),
}

impl From<DebugMode> for EngineState {
    fn from(mode: DebugMode) -> Self {
        match mode {
            DebugMode::Running => EngineState::Running,
            DebugMode::Stepping => EngineState::Stepping,
        }
    }
}

/// Controls for cooperative cancellation and wall-clock limiting.
#[derive(Clone, Default)]
pub struct StepControl {
    pub cancel_flag: Arc<AtomicBool>,
    pub timeout: Option<Duration>,
}

impl StepControl {
    pub fn new(cancel_flag: Arc<AtomicBool>, timeout: Option<Duration>) -> Self {
        Self { cancel_flag, timeout }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }
}

/// Output hook: receives each byte written by `.` as it happens.
pub type OutputSink = Box<dyn FnMut(u8) + Send>;

/// A single-program interpreter with optional debugger.
pub struct Interpreter {
    program: Program,
    tape: Tape,
    limits: Limits,
    state: EngineState,
    input: Box<dyn InputSource>,
    pending_input: VecDeque<u8>,
    output_sink: Option<OutputSink>,
    debugger: Option<DebugSession>,
}

impl Interpreter {
    /// Create an interpreter for an already parsed program, with a default
    /// 30,000-cell tape, default limits, and stdin as input.
    pub fn new(program: Program) -> Self {
        Self {
            program,
            tape: Tape::new(),
            limits: Limits::default(),
            state: EngineState::Running,
            input: Box::new(StdinSource),
            pending_input: VecDeque::new(),
            output_sink: None,
            debugger: None,
        }
    }

    /// Parse `source` and create an interpreter for it.
    pub fn from_source(source: &str) -> Result<Self, ProgramError> {
        Ok(Self::new(Program::parse(source)?))
    }

    /// Use a tape with a custom number of cells.
    pub fn with_tape_len(mut self, len: usize) -> Self {
        self.tape = Tape::with_len(len);
        self
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    /// Provide the source `,` (and the debugger prompt) read from.
    pub fn set_input_source<I>(&mut self, input: I)
    where
        I: InputSource + 'static,
    {
        self.input = Box::new(input);
    }

    /// Provide an output sink. `.` still records into the outcome as well.
    pub fn set_output_sink<F>(&mut self, sink: F)
    where
        F: FnMut(u8) + Send + 'static,
    {
        self.output_sink = Some(Box::new(sink));
    }

    /// Turn on debug mode with the given session.
    pub fn set_debugger(&mut self, session: DebugSession) {
        self.debugger = Some(session);
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn debugger(&self) -> Option<&DebugSession> {
        self.debugger.as_ref()
    }

    /// Execute until completion or until a guard stops the run.
    pub fn run(&mut self) -> Result<RunOutcome, RunError> {
        self.run_with_control(&StepControl::default())
    }

    /// Execute with cooperative cancellation and an optional deadline.
    ///
    /// Every run starts from a zeroed tape; the tape is left as the run
    /// finished it for inspection afterwards.
    pub fn run_with_control(&mut self, control: &StepControl) -> Result<RunOutcome, RunError> {
        self.tape = Tape::with_len(self.tape.len());
        self.pending_input.clear();
        self.state = EngineState::Running;
        if let Some(session) = self.debugger.as_mut() {
            session.reset();
        }

        let started = Instant::now();
        let deadline = control.timeout.map(|t| started + t);
        let mut guard = SafetyGuard::new(self.limits.clone());
        let mut output = String::new();
        let mut iterations: u64 = 0;
        let mut ip: usize = 0;
        let code_len = self.program.len();

        info!(
            instructions = code_len,
            breakpoints = self.program.breakpoints().len(),
            debug = self.debugger.is_some(),
            max_iterations = self.limits.max_iterations,
            "execution started"
        );

        let reason = loop {
            if ip >= code_len {
                break TerminationReason::Completed;
            }

            if control.is_cancelled() {
                break TerminationReason::Interrupted;
            }
            if let (Some(deadline), Some(limit)) = (deadline, control.timeout) {
                if Instant::now() >= deadline {
                    break TerminationReason::TimedOut { limit };
                }
            }

            iterations += 1;
            if let Verdict::IterationLimitExceeded { limit } = guard.check_iterations(iterations) {
                break TerminationReason::IterationLimitExceeded { limit };
            }

            let fingerprint = Fingerprint {
                cursor: self.tape.cursor(),
                ip,
                cell: self.tape.read(),
                tape_digest: self.tape.digest(),
            };
            if guard.observe(fingerprint) == Verdict::InfiniteLoopSuspected {
                break TerminationReason::InfiniteLoopSuspected;
            }

            let instr = self.program.char_at(ip).unwrap_or(' ');

            if let Some(session) = self.debugger.as_mut() {
                let at_breakpoint = self.program.is_breakpoint(ip);
                let snapshot = Snapshot {
                    tape: &self.tape,
                    ip,
                    instruction: instr,
                    output: &output,
                    iterations,
                    at_breakpoint,
                };
                if session.should_pause(at_breakpoint) {
                    self.state = if at_breakpoint {
                        EngineState::PausedAtBreakpoint
                    } else {
                        EngineState::Stepping
                    };
                    debug!(ip, iterations, at_breakpoint, "paused");
                    let outcome = session
                        .pause(&snapshot, self.input.as_mut())
                        .map_err(|source| RunError::Io { ip, source })?;
                    match outcome {
                        PauseOutcome::Quit => break TerminationReason::UserQuit,
                        PauseOutcome::Resume(mode) => self.state = mode.into(),
                    }
                    if control.is_cancelled() {
                        break TerminationReason::Interrupted;
                    }
                } else {
                    session
                        .trace(&snapshot)
                        .map_err(|source| RunError::Io { ip, source })?;
                }
            }

            match Instruction::decode(instr) {
                Instruction::Right => self.tape.move_right(),
                Instruction::Left => self.tape.move_left(),
                Instruction::Inc => self.tape.increment(),
                Instruction::Dec => self.tape.decrement(),
                Instruction::Output => {
                    let byte = self.tape.read();
                    output.push(byte as char);
                    if let Some(sink) = self.output_sink.as_mut() {
                        (sink)(byte);
                    }
                }
                Instruction::Input => {
                    let byte = self.next_input_byte().map_err(|source| RunError::Io { ip, source })?;
                    // the read may have blocked for a long time
                    if control.is_cancelled() {
                        break TerminationReason::Interrupted;
                    }
                    self.tape.write(byte.unwrap_or(0));
                    guard.forget_history();
                }
                Instruction::LoopStart => {
                    if self.tape.read() == 0 {
                        if let Some(j) = self.program.matching_bracket(ip) {
                            ip = j;
                        }
                    }
                }
                Instruction::LoopEnd => {
                    if self.tape.read() != 0 {
                        if let Some(j) = self.program.matching_bracket(ip) {
                            ip = j;
                        }
                    }
                }
                Instruction::NoOp => {}
            }

            // Move to the next instruction
            ip += 1;
        };

        self.state = EngineState::Terminated(reason);
        let outcome = RunOutcome {
            output,
            elapsed: started.elapsed(),
            iterations,
            reason,
        };

        match reason {
            TerminationReason::Completed | TerminationReason::UserQuit => info!(
                reason = %reason,
                iterations,
                elapsed_ms = outcome.execution_time_ms() as u64,
                "execution finished"
            ),
            _ => warn!(
                reason = %reason,
                ip,
                iterations,
                elapsed_ms = outcome.execution_time_ms() as u64,
                "execution aborted"
            ),
        }

        Ok(outcome)
    }

    /// Next byte for `,`, pulling a fresh line when the buffer is empty.
    fn next_input_byte(&mut self) -> std::io::Result<Option<u8>> {
        if self.pending_input.is_empty() {
            if let Some(line) = self.input.read_line()? {
                self.pending_input.extend(line);
            }
        }
        Ok(self.pending_input.pop_front())
    }
}

/// Run `source` with stdin as input, rendering the debugger to stderr when
/// `debug` is set.
pub fn run(source: &str, debug: bool) -> Result<RunOutcome, RunError> {
    let mut interpreter = Interpreter::from_source(source)?;
    if debug {
        interpreter.set_debugger(DebugSession::new(Box::new(std::io::stderr())));
    }
    interpreter.run()
}
