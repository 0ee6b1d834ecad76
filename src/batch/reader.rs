//! Immutable line cursor for the batch parser.
//!
//! A [`LineReader`] covers exactly one line of input, including its
//! terminator. Advancing never mutates: it returns a fresh reader further
//! into the same line, or `None` once the line is consumed. All positions
//! are byte offsets; the parser only advances by offsets found on the
//! remainder, so slicing stays on character boundaries.

/// An immutable cursor over one line of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReader<'a> {
    line: &'a str,
    index: usize,
}

impl<'a> LineReader<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { line, index: 0 }
    }

    /// The whole line this reader covers, terminator included.
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Current byte offset into the line.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes remaining from the current position to end of line.
    pub fn length(&self) -> usize {
        self.line.len() - self.index
    }

    /// The unread remainder of the line.
    pub fn rest(&self) -> &'a str {
        &self.line[self.index..]
    }

    /// Read up to `n` bytes from the current position without advancing.
    pub fn read_string(&self, n: usize) -> &'a str {
        let end = (self.index + n).min(self.line.len());
        &self.line[self.index..end]
    }

    /// A reader advanced by `n` bytes, or `None` once the line is consumed.
    pub fn advance(&self, n: usize) -> Option<LineReader<'a>> {
        let index = self.index + n;
        if index >= self.line.len() {
            None
        } else {
            Some(LineReader {
                line: self.line,
                index,
            })
        }
    }
}

/// Split `input` into lines, keeping each line's terminator attached.
pub(crate) fn lines_with_terminators(input: &str) -> impl Iterator<Item = &str> {
    input.split_inclusive('\n')
}
