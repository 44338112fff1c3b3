//! Circular byte memory with a single movable cursor.
//!
//! Every operation is total: the cursor wraps around both ends of the tape and
//! cell arithmetic wraps modulo 256, so nothing here can fail.

/// Number of cells in a default tape.
pub const DEFAULT_TAPE_LEN: usize = 30_000;

/// A fixed-size circular tape of `u8` cells.
///
/// Alongside the cells the tape keeps a 64-bit digest of its full contents,
/// updated on every write. Loop detection uses it to tell whether the whole
/// machine state has recurred without hashing 30,000 cells per cycle.
#[derive(Debug, Clone)]
pub struct Tape {
    cells: Vec<u8>,
    cursor: usize,
    digest: u64,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// A zeroed tape of [`DEFAULT_TAPE_LEN`] cells with the cursor at 0.
    pub fn new() -> Self {
        Self::with_len(DEFAULT_TAPE_LEN)
    }

    /// A zeroed tape with a custom number of cells. A length of 0 is bumped to 1.
    pub fn with_len(len: usize) -> Self {
        Self {
            cells: vec![0; len.max(1)],
            cursor: 0,
            digest: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Value of the cell at `index`, or `None` past the end.
    pub fn cell(&self, index: usize) -> Option<u8> {
        self.cells.get(index).copied()
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1) % self.cells.len();
    }

    pub fn move_left(&mut self) {
        self.cursor = match self.cursor {
            0 => self.cells.len() - 1,
            n => n - 1,
        };
    }

    pub fn increment(&mut self) {
        self.write(self.read().wrapping_add(1));
    }

    pub fn decrement(&mut self) {
        self.write(self.read().wrapping_sub(1));
    }

    pub fn read(&self) -> u8 {
        self.cells[self.cursor]
    }

    pub fn write(&mut self, value: u8) {
        let old = self.cells[self.cursor];
        if old == value {
            return;
        }
        self.digest ^= cell_term(self.cursor, old) ^ cell_term(self.cursor, value);
        self.cells[self.cursor] = value;
    }

    /// Cells `max(0, cursor - radius) ..= min(len - 1, cursor + radius)`.
    ///
    /// Returns the index of the first cell alongside the slice. The window does
    /// not wrap: near either end it is simply truncated.
    pub fn window(&self, radius: usize) -> (usize, &[u8]) {
        let start = self.cursor.saturating_sub(radius);
        let end = self.cursor.saturating_add(radius).min(self.cells.len() - 1);
        (start, &self.cells[start..=end])
    }
}

/// Contribution of one cell to the tape digest. Zero cells contribute nothing,
/// so a fresh tape has digest 0 and the digest only depends on contents.
fn cell_term(index: usize, value: u8) -> u64 {
    if value == 0 {
        return 0;
    }
    // splitmix64 finalizer
    let mut z = (((index as u64) << 8) | value as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tape_is_zeroed() {
        let tape = Tape::new();
        assert_eq!(tape.len(), DEFAULT_TAPE_LEN);
        assert_eq!(tape.cursor(), 0);
        assert_eq!(tape.read(), 0);
        assert_eq!(tape.digest(), 0);
    }

    #[test]
    fn increment_wraps_after_256() {
        let mut tape = Tape::with_len(1);
        for _ in 0..256 {
            tape.increment();
        }
        assert_eq!(tape.read(), 0);
    }

    #[test]
    fn decrement_from_zero_wraps_to_255() {
        let mut tape = Tape::with_len(1);
        tape.decrement();
        assert_eq!(tape.read(), 255);
    }

    #[test]
    fn move_left_from_zero_wraps_to_end() {
        let mut tape = Tape::new();
        tape.move_left();
        assert_eq!(tape.cursor(), DEFAULT_TAPE_LEN - 1);
    }

    #[test]
    fn move_right_from_end_wraps_to_zero() {
        let mut tape = Tape::with_len(3);
        tape.move_left();
        assert_eq!(tape.cursor(), 2);
        tape.move_right();
        assert_eq!(tape.cursor(), 0);
    }

    #[test]
    fn digest_tracks_contents_not_history() {
        let mut tape = Tape::with_len(8);
        tape.increment();
        tape.move_right();
        tape.increment();
        let with_two = tape.digest();
        assert_ne!(with_two, 0);

        tape.decrement();
        tape.move_left();
        tape.decrement();
        assert_eq!(tape.digest(), 0, "zeroing every cell restores the empty digest");

        tape.write(7);
        let seven = tape.digest();
        tape.write(9);
        tape.write(7);
        assert_eq!(tape.digest(), seven);
    }

    #[test]
    fn window_is_truncated_at_both_ends() {
        let mut tape = Tape::with_len(20);
        let (start, cells) = tape.window(5);
        assert_eq!(start, 0);
        assert_eq!(cells.len(), 6);

        for _ in 0..10 {
            tape.move_right();
        }
        let (start, cells) = tape.window(5);
        assert_eq!(start, 5);
        assert_eq!(cells.len(), 11);

        tape.move_left();
        for _ in 0..10 {
            tape.move_left();
        }
        // cursor wrapped to 19
        assert_eq!(tape.cursor(), 19);
        let (start, cells) = tape.window(5);
        assert_eq!(start, 14);
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn huge_window_radius_covers_the_whole_tape() {
        let mut tape = Tape::with_len(10);
        tape.move_right();
        let (start, cells) = tape.window(usize::MAX);
        assert_eq!(start, 0);
        assert_eq!(cells.len(), 10);
    }
}
