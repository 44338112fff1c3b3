use clap::Args;
use std::env;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::cli_util::{abort_message, print_run_error, print_script_error, stats_line};
use crate::config::{parse_secs, Settings};
use crate::debugger::{DebugMode, DebugSession};
use crate::input::StdinSource;
use crate::interpreter::{Interpreter, RunError, StepControl, TerminationReason};
use crate::scripts;
use crate::theme::Theme;

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    /// Script name (looked up in the scripts directory) or path
    #[arg(value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Trace execution and stop at '#' breakpoints
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Start the debugger stepping from the first instruction (implies --debug)
    #[arg(short = 's', long = "step")]
    pub step: bool,

    /// Wall-clock timeout in seconds (fallback BF_TIMEOUT_SECS; default none)
    #[arg(short = 't', long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<String>,

    /// Maximum cycles before abort (fallback BF_MAX_ITERATIONS; default 10,000,000)
    #[arg(long = "max-iterations", value_name = "N")]
    pub max_iterations: Option<u64>,

    /// Disable the infinite-loop heuristic; only the iteration cap applies
    #[arg(long = "no-loop-detect")]
    pub no_loop_detect: bool,

    /// Print status, iterations, and elapsed time to stderr after the run
    #[arg(long = "stats")]
    pub stats: bool,

    /// Directory searched for scripts by name (fallback BF_SCRIPTS_DIR; default ./scripts)
    #[arg(long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs, settings: &Settings) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    let Some(script) = args.script.as_deref() else {
        usage_and_exit(program, 2);
    };

    let timeout = match args.timeout.as_deref() {
        Some(raw) => match parse_secs(raw) {
            Some(t) => Some(t),
            None => {
                eprintln!("{program}: invalid --timeout value '{raw}' (expected seconds)");
                usage_and_exit(program, 2);
            }
        },
        None => settings.timeout,
    };

    let dir = args.dir.clone().unwrap_or_else(|| settings.scripts_dir.clone());
    let path = match scripts::resolve(script, &dir) {
        Ok(p) => p,
        Err(e) => {
            print_script_error(program, &e);
            return 1;
        }
    };
    let source = match scripts::load(&path) {
        Ok(s) => s,
        Err(e) => {
            print_script_error(program, &e);
            return 1;
        }
    };

    let mut limits = settings.limits.clone();
    if let Some(max) = args.max_iterations {
        limits.max_iterations = max;
    }
    if args.no_loop_detect {
        limits.loop_detection = false;
    }

    let mut bf = match Interpreter::from_source(&source) {
        Ok(bf) => bf,
        Err(e) => {
            print_run_error(Some(program), &source, &RunError::from(e));
            return 1;
        }
    };
    bf.set_limits(limits);
    bf.set_input_source(StdinSource);
    bf.set_output_sink(|b| {
        let mut out = io::stdout().lock();
        let _ = out.write_all(&[b]);
        let _ = out.flush();
    });

    let debug_enabled = args.debug || args.step;
    if debug_enabled {
        let theme = if io::stderr().is_terminal() && env::var_os("NO_COLOR").is_none() {
            Theme::colored(settings.palette)
        } else {
            Theme::plain()
        };
        let mode = if args.step { DebugMode::Stepping } else { DebugMode::Running };
        bf.set_debugger(
            DebugSession::new(Box::new(io::stderr()))
                .with_mode(mode)
                .with_theme(theme)
                .with_pacing(settings.debug_delay)
                .with_window_radius(settings.window_radius),
        );
    }

    // First ctrl+c asks the interpreter to stop; a second one exits at once,
    // since a blocking read only sees the flag after it returns.
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::Relaxed) {
            let _ = io::stdout().flush();
            let _ = io::stderr().flush();
            std::process::exit(130);
        }
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    info!(script = %path.display(), debug = debug_enabled, timeout_ms = timeout.map(|t| t.as_millis() as u64), "running script");
    let control = StepControl::new(cancel, timeout);
    let outcome = match bf.run_with_control(&control) {
        Ok(outcome) => outcome,
        Err(e) => {
            println!();
            let _ = io::stdout().flush();
            print_run_error(Some(program), &source, &e);
            return 1;
        }
    };

    // For readability, ensure output ends with a newline
    if !outcome.output.is_empty() && !outcome.output.ends_with('\n') {
        println!();
    }
    let _ = io::stdout().flush();

    if let Some(msg) = abort_message(&outcome) {
        eprintln!("{msg}");
    }
    if args.stats {
        eprintln!("{}", stats_line(&outcome));
    }
    let _ = io::stderr().flush();

    exit_code(outcome.reason)
}

fn exit_code(reason: TerminationReason) -> i32 {
    match reason {
        TerminationReason::Completed | TerminationReason::UserQuit => 0,
        TerminationReason::Interrupted => 130,
        TerminationReason::IterationLimitExceeded { .. }
        | TerminationReason::InfiniteLoopSuspected
        | TerminationReason::TimedOut { .. } => 1,
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] <SCRIPT>

Options:
  --debug, -d              Trace execution; pause at '#' breakpoints
  --step,  -s              Start the debugger in step mode (implies --debug)
  --timeout, -t <SECONDS>  Abort after this much wall-clock time
  --max-iterations <N>     Abort after N cycles (default 10,000,000)
  --no-loop-detect         Only use the iteration cap, not the loop heuristic
  --stats                  Print status, iterations, and time to stderr
  --dir <DIR>              Directory searched for scripts by name (default ./scripts)
  --help, -h               Show this help

Debugger commands (at the pause prompt):
  c   continue until the next breakpoint
  s   step one instruction
  q   quit, keeping the output produced so far

Notes:
- SCRIPT is a path, or a name looked up in the scripts directory (".bf" optional).
- Input (`,`) reads from stdin one byte at a time; at EOF the cell is set to 0.
- Characters outside ><+-.,[]# are ignored.
- Ctrl+C stops the run; press it twice to exit immediately.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
