//! Interactive debugging: breakpoints, single-stepping, and a tape view.
//!
//! The session never touches interpreter state. The interpreter hands it a
//! read-only [`Snapshot`] each cycle and gets back a [`PauseOutcome`] telling it
//! how to carry on.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::input::InputSource;
use crate::tape::Tape;
use crate::theme::Theme;

/// Cells shown on each side of the cursor.
pub const DEFAULT_WINDOW_RADIUS: usize = 5;
/// Pause between frames when tracing without stopping.
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Whether the next cycle stops for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugMode {
    Running,
    Stepping,
}

/// A command typed at the pause prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Continue,
    Step,
    Quit,
    Unknown,
}

impl DebugCommand {
    /// Only the first non-blank character counts, case-insensitively.
    pub fn parse(line: &str) -> Self {
        match line.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('c') => DebugCommand::Continue,
            Some('s') => DebugCommand::Step,
            Some('q') => DebugCommand::Quit,
            _ => DebugCommand::Unknown,
        }
    }
}

/// What the interpreter should do after a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Resume(DebugMode),
    Quit,
}

/// Read-only view of the interpreter at the top of a cycle.
pub struct Snapshot<'a> {
    pub tape: &'a Tape,
    pub ip: usize,
    pub instruction: char,
    pub output: &'a str,
    pub iterations: u64,
    pub at_breakpoint: bool,
}

pub struct DebugSession {
    mode: DebugMode,
    initial_mode: DebugMode,
    view: Box<dyn Write + Send>,
    theme: Theme,
    pacing: Duration,
    window_radius: usize,
}

impl DebugSession {
    /// A session that renders to `view`, starting in [`DebugMode::Running`].
    pub fn new(view: Box<dyn Write + Send>) -> Self {
        Self {
            mode: DebugMode::Running,
            initial_mode: DebugMode::Running,
            view,
            theme: Theme::plain(),
            pacing: DEFAULT_PACING,
            window_radius: DEFAULT_WINDOW_RADIUS,
        }
    }

    /// Mode the session starts in, and returns to on [`DebugSession::reset`].
    pub fn with_mode(mut self, mode: DebugMode) -> Self {
        self.mode = mode;
        self.initial_mode = mode;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_window_radius(mut self, radius: usize) -> Self {
        self.window_radius = radius;
        self
    }

    pub fn mode(&self) -> DebugMode {
        self.mode
    }

    /// Back to the starting mode, for a fresh run.
    pub fn reset(&mut self) {
        self.mode = self.initial_mode;
    }

    pub fn should_pause(&self, at_breakpoint: bool) -> bool {
        self.mode == DebugMode::Stepping || at_breakpoint
    }

    /// Apply one command to the mode. `Unknown` leaves it untouched.
    pub fn apply(&mut self, command: DebugCommand) -> PauseOutcome {
        match command {
            DebugCommand::Continue => self.mode = DebugMode::Running,
            DebugCommand::Step => self.mode = DebugMode::Stepping,
            DebugCommand::Quit => return PauseOutcome::Quit,
            DebugCommand::Unknown => {}
        }
        PauseOutcome::Resume(self.mode)
    }

    /// Show the tape, prompt, and block for one command line.
    ///
    /// End of input counts as `c`, so a closed stdin cannot wedge the session.
    pub fn pause(&mut self, snapshot: &Snapshot<'_>, input: &mut dyn InputSource) -> io::Result<PauseOutcome> {
        self.render(snapshot)?;
        write!(self.view, "{}", self.theme.paint(self.theme.palette.label, false, "(c)ontinue (s)tep (q)uit > "))?;
        self.view.flush()?;

        let command = match input.read_line()? {
            Some(line) => DebugCommand::parse(&String::from_utf8_lossy(&line)),
            None => {
                writeln!(self.view)?;
                DebugCommand::Continue
            }
        };
        debug!(ip = snapshot.ip, ?command, "debugger command");
        Ok(self.apply(command))
    }

    /// Render without stopping, then wait out the pacing delay.
    pub fn trace(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()> {
        self.render(snapshot)?;
        if !self.pacing.is_zero() {
            thread::sleep(self.pacing);
        }
        Ok(())
    }

    pub fn render(&mut self, snapshot: &Snapshot<'_>) -> io::Result<()> {
        let frame = self.frame(snapshot);
        self.view.write_all(frame.as_bytes())?;
        self.view.flush()
    }

    /// Build one frame of the tape view as text.
    pub fn frame(&self, snapshot: &Snapshot<'_>) -> String {
        let theme = &self.theme;
        let palette = &theme.palette;
        let mut out = String::new();

        let marker = if snapshot.at_breakpoint {
            theme.paint(palette.breakpoint, true, "[breakpoint] ")
        } else if self.mode == DebugMode::Stepping {
            theme.paint(palette.label, true, "[step] ")
        } else {
            String::new()
        };
        let instr = theme.paint(palette.instruction, true, &format!("'{}'", snapshot.instruction.escape_debug()));
        let _ = writeln!(
            out,
            "{marker}ip={} instr={instr} iterations={} ptr={}",
            snapshot.ip,
            snapshot.iterations,
            snapshot.tape.cursor()
        );

        let (start, cells) = snapshot.tape.window(self.window_radius);
        let mut index_row = String::from("  ");
        let mut value_row = String::from("  ");
        for (offset, value) in cells.iter().enumerate() {
            let index = start + offset;
            let _ = write!(index_row, "{index:^7}");
            let cell = if index == snapshot.tape.cursor() {
                theme.paint(palette.cursor, true, &format!("[{value:>3}]"))
            } else if *value == 0 {
                theme.paint(palette.cell_empty, false, &format!(" {value:>3} "))
            } else {
                theme.paint(palette.cell_nonzero, false, &format!(" {value:>3} "))
            };
            let _ = write!(value_row, " {cell}  ");
        }
        let _ = writeln!(out, "{}", index_row.trim_end());
        let _ = writeln!(out, "{}", value_row.trim_end());

        let shown = theme.paint(palette.output, false, &snapshot.output.escape_debug().to_string());
        let _ = writeln!(out, "  output: \"{shown}\"");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScriptedInput;
    use std::sync::{Arc, Mutex};

    /// Clonable in-memory writer so tests can inspect what was rendered.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn session() -> (DebugSession, SharedBuf) {
        let buf = SharedBuf::default();
        let session = DebugSession::new(Box::new(buf.clone())).with_pacing(Duration::ZERO);
        (session, buf)
    }

    fn snapshot(tape: &Tape) -> Snapshot<'_> {
        Snapshot {
            tape,
            ip: 3,
            instruction: '+',
            output: "hi\n",
            iterations: 4,
            at_breakpoint: true,
        }
    }

    #[test]
    fn parse_uses_first_character_only() {
        assert_eq!(DebugCommand::parse("c\n"), DebugCommand::Continue);
        assert_eq!(DebugCommand::parse("  Step"), DebugCommand::Step);
        assert_eq!(DebugCommand::parse("quit"), DebugCommand::Quit);
        assert_eq!(DebugCommand::parse(""), DebugCommand::Unknown);
        assert_eq!(DebugCommand::parse("x"), DebugCommand::Unknown);
    }

    #[test]
    fn step_and_continue_transition_from_stepping() {
        let (session, _) = session();
        let mut session = session.with_mode(DebugMode::Stepping);

        assert_eq!(session.apply(DebugCommand::Step), PauseOutcome::Resume(DebugMode::Stepping));
        assert_eq!(session.apply(DebugCommand::Unknown), PauseOutcome::Resume(DebugMode::Stepping));
        assert_eq!(session.apply(DebugCommand::Continue), PauseOutcome::Resume(DebugMode::Running));
        assert_eq!(session.apply(DebugCommand::Unknown), PauseOutcome::Resume(DebugMode::Running));
        assert_eq!(session.apply(DebugCommand::Step), PauseOutcome::Resume(DebugMode::Stepping));
    }

    #[test]
    fn quit_ends_from_any_mode() {
        let (mut session, _) = session();
        assert_eq!(session.apply(DebugCommand::Quit), PauseOutcome::Quit);
        session.apply(DebugCommand::Step);
        assert_eq!(session.apply(DebugCommand::Quit), PauseOutcome::Quit);
    }

    #[test]
    fn should_pause_on_breakpoints_or_while_stepping() {
        let (mut session, _) = session();
        assert!(!session.should_pause(false));
        assert!(session.should_pause(true));
        session.apply(DebugCommand::Step);
        assert!(session.should_pause(false));
    }

    #[test]
    fn pause_reads_one_command_line() {
        let (mut session, buf) = session();
        let tape = Tape::with_len(16);
        let mut input = ScriptedInput::new(["s\n", "q\n"]);

        let outcome = session.pause(&snapshot(&tape), &mut input).unwrap();
        assert_eq!(outcome, PauseOutcome::Resume(DebugMode::Stepping));
        assert_eq!(input.remaining(), 1);
        assert!(buf.contents().contains("(c)ontinue (s)tep (q)uit"));
    }

    #[test]
    fn end_of_input_at_prompt_continues() {
        let (session, _) = session();
        let mut session = session.with_mode(DebugMode::Stepping);
        let tape = Tape::with_len(16);
        let mut input = ScriptedInput::default();

        let outcome = session.pause(&snapshot(&tape), &mut input).unwrap();
        assert_eq!(outcome, PauseOutcome::Resume(DebugMode::Running));
    }

    #[test]
    fn frame_marks_cursor_and_escapes_output() {
        let (session, _) = session();
        let mut tape = Tape::with_len(30);
        for _ in 0..7 {
            tape.move_right();
        }
        tape.increment();
        tape.increment();

        let frame = session.frame(&snapshot(&tape));
        assert!(frame.starts_with("[breakpoint] ip=3 instr='+' iterations=4 ptr=7"));
        assert!(frame.contains("[  2]"));
        assert!(frame.contains("output: \"hi\\n\""));

        let index_row = frame.lines().nth(1).unwrap();
        let indices: Vec<usize> = index_row.split_whitespace().map(|s| s.parse().unwrap()).collect();
        assert_eq!(indices, (2..=12).collect::<Vec<_>>());
    }
}
