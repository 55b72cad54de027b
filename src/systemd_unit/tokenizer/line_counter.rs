use crate::systemd_unit::LineEnding;

pub(super) const CR: u16 = b'\r' as u16;
pub(super) const LF: u16 = b'\n' as u16;

/// Tracks line and column of the most recently pushed character.
///
/// A `\r` that may turn out to be the first half of `\r\n` is counted
/// provisionally. When the next character shows it is not a line terminator,
/// the tokenizer retraces it: the column is taken back by one for the next
/// character, and restored once the `\r` has been handed to the classifier.
#[derive(Debug)]
pub(super) struct LineCounter {
    line_ending: LineEnding,
    previous_cr: bool,
    line: usize,
    column: usize,
}

impl LineCounter {
    pub(super) fn new(line_ending: LineEnding) -> Self {
        Self {
            line_ending,
            previous_cr: false,
            line: 1,
            column: 0,
        }
    }

    pub(super) fn line(&self) -> usize {
        self.line
    }

    pub(super) fn column(&self) -> usize {
        self.column
    }

    /// Whether a provisionally counted `\r` is still pending.
    pub(super) fn pending_cr(&self) -> bool {
        self.previous_cr
    }

    /// Returns `true` if `c` terminates the current line.
    pub(super) fn push(&mut self, c: u16) -> bool {
        let terminates = match c {
            CR => self.line_ending.ends_on_cr(),
            LF => self.line_ending.ends_on_lf(self.previous_cr),
            _ => false,
        };

        if terminates {
            self.previous_cr = false;
            self.line += 1;
            self.column = 0;
        } else {
            self.previous_cr = c == CR;
            self.column += 1;
        }

        terminates
    }

    pub(super) fn push_pair(&mut self) {
        self.previous_cr = false;
        self.column += 1;
    }

    /// Takes back the column of a pending `\r`, returns whether there was one.
    pub(super) fn retrace_cr(&mut self) -> bool {
        if self.previous_cr {
            self.column -= 1;
        }
        self.previous_cr
    }

    /// Gives back the column taken by [`LineCounter::retrace_cr`].
    pub(super) fn retrace_fix_count(&mut self) {
        self.column += 1;
    }
}
