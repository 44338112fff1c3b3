//! Line-oriented input used by `,` and by the debugger prompt.

use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Something the interpreter can ask for a line of input.
///
/// Lines are raw bytes: `,` hands them to the program one byte at a time, so
/// multibyte and non-UTF-8 input survive unchanged. `Ok(None)` means end of
/// input. Reader-backed sources keep the trailing newline, which `,` delivers
/// as code 10.
pub trait InputSource {
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>>;
}

/// Input read from any buffered reader, e.g. locked stdin or a file.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> InputSource for ReaderSource<R> {
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

/// Process stdin, locked only while a line is being read.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinSource;

impl InputSource for StdinSource {
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        // the lock shares stdin's global buffer, so nothing is lost between calls
        ReaderSource::new(io::stdin().lock()).read_line()
    }
}

/// Pre-recorded lines, handed out in order. Lines are returned exactly as
/// given, with no newline appended.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    lines: VecDeque<Vec<u8>>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Vec<u8>>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl InputSource for ScriptedInput {
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.lines.pop_front())
    }
}

/// No input at all; every read reports end of input.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyInput;

impl InputSource for EmptyInput {
    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(None)
    }
}
