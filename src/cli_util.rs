use std::io::{self, Write};

use crate::interpreter::{RunError, RunOutcome, TerminationReason};
use crate::program::ProgramError;
use crate::scripts::ScriptError;

/// Pretty-print a [`RunError`] with caret positioning where a position is known.
/// If `program` is `Some("bf")`, prefix messages with "bf: ...".
pub fn print_run_error(program: Option<&str>, code: &str, err: &RunError) {
    match err {
        RunError::Program(ProgramError::UnmatchedBracket { position, kind }) => {
            let msg = prefix_program(program, &format!("Parse error: unmatched bracket {kind}"));
            print_error_with_context(&msg, code, *position);
        }
        RunError::Io { ip, source } => {
            let msg = prefix_program(program, &format!("I/O error at instruction {ip}: {source}"));
            eprintln!("{msg}");
            let _ = io::stderr().flush();
        }
    }
}

/// Print a script lookup failure, listing the paths that were tried.
pub fn print_script_error(program: &str, err: &ScriptError) {
    eprintln!("{program}: {err}");
    if let ScriptError::NotFound { searched, .. } = err {
        for path in searched {
            eprintln!("  tried {}", path.display());
        }
    }
    let _ = io::stderr().flush();
}

/// One-line explanation for a run that did not complete normally.
pub fn abort_message(outcome: &RunOutcome) -> Option<String> {
    match outcome.reason {
        TerminationReason::Completed => None,
        TerminationReason::UserQuit => Some("Execution stopped: quit from debugger".to_string()),
        TerminationReason::IterationLimitExceeded { limit } => {
            Some(format!("Execution aborted: iteration limit exceeded ({limit})"))
        }
        TerminationReason::InfiniteLoopSuspected => Some(format!(
            "Execution aborted: infinite loop suspected after {} iterations",
            outcome.iterations
        )),
        TerminationReason::Interrupted => Some("Execution aborted: interrupted".to_string()),
        TerminationReason::TimedOut { limit } => Some(format!(
            "Execution aborted: wall-clock timeout exceeded ({} ms)",
            limit.as_millis()
        )),
    }
}

/// Summary line printed with `--stats`.
pub fn stats_line(outcome: &RunOutcome) -> String {
    format!(
        "status={} reason={} iterations={} time={}ms",
        outcome.status(),
        outcome.reason,
        outcome.iterations,
        outcome.execution_time_ms()
    )
}

fn prefix_program(program: Option<&str>, msg: &str) -> String {
    match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg.to_string(),
    }
}

/// Print a concise error with source position and a caret context window,
/// working with UTF-8 by slicing using char indices.
pub fn print_error_with_context(prefix: &str, code: &str, pos: usize) {
    eprintln!("{prefix} at position {pos}");

    // Show a short window around the position for context
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    let start_byte = char_to_byte_index(code, start_char);
    let end_byte = char_to_byte_index(code, end_char);
    // newlines inside the window would break the caret alignment
    let slice: String = code[start_byte..end_byte]
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .collect();

    eprintln!("  {}", slice);

    let caret_offset_chars = pos.saturating_sub(start_char);
    eprintln!("  {}^", " ".repeat(caret_offset_chars));
    let _ = io::stderr().flush();
}

/// Convert a char index into a byte index in the given UTF-8 string.
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(reason: TerminationReason) -> RunOutcome {
        RunOutcome {
            output: String::new(),
            elapsed: Duration::from_millis(12),
            iterations: 7,
            reason,
        }
    }

    #[test]
    fn char_to_byte_index_handles_multibyte() {
        let s = "é+ü";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 1), 2);
        assert_eq!(char_to_byte_index(s, 3), s.len());
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn abort_messages_name_the_guard() {
        assert_eq!(abort_message(&outcome(TerminationReason::Completed)), None);
        let msg = abort_message(&outcome(TerminationReason::IterationLimitExceeded { limit: 50 })).unwrap();
        assert!(msg.contains("iteration limit exceeded (50)"));
        let msg = abort_message(&outcome(TerminationReason::TimedOut { limit: Duration::from_secs(1) })).unwrap();
        assert!(msg.contains("timeout"));
    }

    #[test]
    fn stats_line_reports_status_and_reason() {
        let line = stats_line(&outcome(TerminationReason::InfiniteLoopSuspected));
        assert_eq!(line, "status=terminated reason=infinite-loop-suspected iterations=7 time=12ms");
    }
}
