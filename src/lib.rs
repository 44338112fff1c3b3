//! A Brainfuck interpreter with an interactive debugger.
//!
//! Programs run on a circular tape (default 30,000 cells) with a single data
//! pointer.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; the pointer wraps at both ends and cells
//!   wrap modulo 256, so no instruction can fail at runtime.
//! - Input `,` reads one byte from a line-oriented input source; at end
//!   of input the current cell is set to 0.
//! - Output `.` appends the current cell as a character to the run's output.
//! - Nested loops `[]` are matched once up front; unbalanced brackets are
//!   reported before anything runs.
//! - Characters outside `><+-.,[]` are no-ops, except `#`, which marks a
//!   breakpoint for debug runs.
//! - Runaway programs are stopped by an iteration cap and an infinite-loop
//!   heuristic; an optional wall-clock deadline and a cancellation token are
//!   polled every cycle.
//!
//! Quick start:
//!
//! ```no_run
//! // Classic "Hello World!" in Brainfuck
//! let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
//! let outcome = rust_bf_debug::run(code, false).expect("program should run");
//! assert_eq!(outcome.output, "Hello World!\n");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod debugger;
pub mod guard;
pub mod input;
pub mod interpreter;
pub mod logging;
pub mod program;
pub mod scripts;
pub mod tape;
pub mod theme;

pub use debugger::{DebugCommand, DebugMode, DebugSession, PauseOutcome};
pub use guard::{HistoryPolicy, Limits};
pub use input::{InputSource, ScriptedInput, StdinSource};
pub use interpreter::{
    run, EngineState, Interpreter, RunError, RunOutcome, RunStatus, StepControl, TerminationReason,
};
pub use program::{Program, ProgramError, UnmatchedBracketKind, BREAKPOINT_MARKER};
pub use tape::Tape;
