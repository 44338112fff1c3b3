//! Turning source text into an executable instruction stream.

use std::collections::BTreeSet;
use std::fmt;

/// Character that marks a breakpoint in source text.
pub const BREAKPOINT_MARKER: char = '#';

/// Errors detected while building a [`Program`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// Loops were not balanced; a matching `[` or `]` was not found.
    #[error("Unmatched bracket {kind} at position {position}")]
    UnmatchedBracket { position: usize, kind: UnmatchedBracketKind },
}

impl ProgramError {
    /// Offset into the original source text (char index).
    pub fn position(&self) -> usize {
        match self {
            ProgramError::UnmatchedBracket { position, .. } => *position,
        }
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// One decoded instruction. Anything outside the eight operators decodes to
/// [`Instruction::NoOp`] and still costs a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Right,
    Left,
    Inc,
    Dec,
    Output,
    Input,
    LoopStart,
    LoopEnd,
    NoOp,
}

impl Instruction {
    pub fn decode(ch: char) -> Self {
        match ch {
            '>' => Instruction::Right,
            '<' => Instruction::Left,
            '+' => Instruction::Inc,
            '-' => Instruction::Dec,
            '.' => Instruction::Output,
            ',' => Instruction::Input,
            '[' => Instruction::LoopStart,
            ']' => Instruction::LoopEnd,
            _ => Instruction::NoOp,
        }
    }
}

/// An immutable instruction stream with its breakpoints and bracket jump table.
///
/// Breakpoints are stored in the stream's own coordinates: a `#` at source
/// offset `n` with `k` markers before it becomes position `n - k`, the index of
/// the instruction that followed it. The engine pauses before executing that
/// instruction.
#[derive(Debug, Clone)]
pub struct Program {
    code: Vec<char>,
    breakpoints: BTreeSet<usize>,
    breakpoint_sources: Vec<usize>,
    // jumps[i] holds the matching index for '[' or ']' at index i
    jumps: Vec<Option<usize>>,
}

impl Program {
    /// Parse `source`, extract breakpoints, and validate bracket nesting.
    pub fn parse(source: &str) -> Result<Self, ProgramError> {
        let mut code = Vec::with_capacity(source.len());
        // source char offset of every stream index, for error positions
        let mut source_offsets = Vec::with_capacity(source.len());
        let mut breakpoints = BTreeSet::new();
        let mut breakpoint_sources = Vec::new();

        for (offset, ch) in source.chars().enumerate() {
            if ch == BREAKPOINT_MARKER {
                breakpoint_sources.push(offset);
                breakpoints.insert(code.len());
            } else {
                code.push(ch);
                source_offsets.push(offset);
            }
        }

        let mut jumps: Vec<Option<usize>> = vec![None; code.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, &c) in code.iter().enumerate() {
            if c == '[' {
                stack.push(i);
            } else if c == ']' {
                let Some(open_index) = stack.pop() else {
                    return Err(ProgramError::UnmatchedBracket {
                        position: source_offsets[i],
                        kind: UnmatchedBracketKind::Close,
                    });
                };
                jumps[open_index] = Some(i);
                jumps[i] = Some(open_index);
            }
        }
        if let Some(unmatched_open) = stack.last().copied() {
            return Err(ProgramError::UnmatchedBracket {
                position: source_offsets[unmatched_open],
                kind: UnmatchedBracketKind::Open,
            });
        }

        Ok(Self {
            code,
            breakpoints,
            breakpoint_sources,
            jumps,
        })
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Raw character at `ip`, markers already removed.
    pub fn char_at(&self, ip: usize) -> Option<char> {
        self.code.get(ip).copied()
    }

    pub fn instruction(&self, ip: usize) -> Option<Instruction> {
        self.char_at(ip).map(Instruction::decode)
    }

    /// The executable stream as text.
    pub fn text(&self) -> String {
        self.code.iter().collect()
    }

    pub fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    pub fn is_breakpoint(&self, ip: usize) -> bool {
        self.breakpoints.contains(&ip)
    }

    /// Offsets of every marker in the original source.
    pub fn breakpoint_sources(&self) -> &[usize] {
        &self.breakpoint_sources
    }

    /// Index of the bracket matching the one at `ip`.
    pub fn matching_bracket(&self, ip: usize) -> Option<usize> {
        self.jumps.get(ip).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_is_translated_into_stream_coordinates() {
        let program = Program::parse("++#+.").expect("valid program");
        assert_eq!(program.text(), "+++.");
        assert_eq!(program.breakpoints().iter().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(program.breakpoint_sources(), &[2]);
        assert_eq!(program.char_at(2), Some('+'));
    }

    #[test]
    fn later_markers_account_for_earlier_ones() {
        let program = Program::parse("#+#+#").expect("valid program");
        assert_eq!(program.text(), "++");
        assert_eq!(program.breakpoints().iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(program.breakpoint_sources(), &[0, 2, 4]);
    }

    #[test]
    fn adjacent_markers_collapse() {
        let program = Program::parse("+##+").expect("valid program");
        assert_eq!(program.breakpoints().len(), 1);
        assert!(program.is_breakpoint(1));
    }

    #[test]
    fn unknown_characters_are_kept_as_no_ops() {
        let program = Program::parse("a+ b").expect("valid program");
        assert_eq!(program.len(), 4);
        assert_eq!(program.instruction(0), Some(Instruction::NoOp));
        assert_eq!(program.instruction(1), Some(Instruction::Inc));
        assert_eq!(program.instruction(2), Some(Instruction::NoOp));
    }

    #[test]
    fn jump_table_pairs_nested_brackets() {
        let program = Program::parse("[[]+]").expect("valid program");
        assert_eq!(program.matching_bracket(0), Some(4));
        assert_eq!(program.matching_bracket(4), Some(0));
        assert_eq!(program.matching_bracket(1), Some(2));
        assert_eq!(program.matching_bracket(3), None);
    }

    #[test]
    fn unmatched_open_bracket_reports_source_position() {
        let err = Program::parse("#+[").unwrap_err();
        assert!(matches!(
            err,
            ProgramError::UnmatchedBracket { position: 2, kind: UnmatchedBracketKind::Open }
        ));
    }

    #[test]
    fn unmatched_close_bracket_is_rejected() {
        let err = Program::parse("+]").unwrap_err();
        assert!(matches!(err, ProgramError::UnmatchedBracket { kind: UnmatchedBracketKind::Close, .. }));
        assert_eq!(err.position(), 1);
    }
}
