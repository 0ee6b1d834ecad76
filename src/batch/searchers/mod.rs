//! Range and special-token searchers.
//!
//! A range searcher recognizes a start/end code pair that makes the
//! enclosed text opaque: a comment, which may be stripped from the output,
//! or a quoted literal, which may not. A special-token searcher recognizes
//! a batch separator such as a standalone `GO`. Each dialect supplies its
//! own sets; see [`Dialect`](crate::batch::Dialect).

pub mod ranges;
pub mod tokens;

use crate::batch::reader::LineReader;

/// Result of searching for an open range's end code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCodeMatch {
    /// The end code was found at this byte offset in the remainder.
    End { index: usize },
    /// A nested start code was found first; the parser pushes the range
    /// again without popping the outer one.
    NestedStart { index: usize },
}

/// Recognizes one kind of opaque span (comment or quoted literal).
pub trait RangeSearcher {
    /// Byte length of the start code.
    fn start_code_length(&self) -> usize;

    /// Byte length of the end code. Zero for ranges closed by the end of
    /// the line itself.
    fn end_code_length(&self) -> usize;

    /// Comments may be stripped from the output; literals never are.
    fn is_comment(&self) -> bool;

    /// Byte offset of the earliest start code in the reader's remainder.
    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize>;

    /// Search the remainder for this range's end code or a nested start.
    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch>;

    /// Short name used in parse errors ("block comment", "string literal").
    fn description(&self) -> &'static str;
}

/// A matched batch separator token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Byte offset of the match in the reader's remainder.
    pub index: usize,
    /// Byte length of the matched span.
    pub length: usize,
    /// The canonical token text, e.g. `"GO"`.
    pub token: &'static str,
    /// Dialect-specific payload, e.g. the repeat count of `GO 3`.
    pub payload: Option<String>,
}

/// Recognizes a batch separator token outside any range.
pub trait SpecialTokenSearcher {
    fn find_token(&self, reader: &LineReader<'_>) -> Option<TokenMatch>;
}
