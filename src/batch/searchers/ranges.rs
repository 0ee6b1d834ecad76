//! Range searchers for the common SQL dialects.
//!
//! Quoted literals and identifiers are symmetric single-character ranges.
//! Line comments run to the end of the line and consume the terminator, so
//! a stripped full-line comment vanishes entirely instead of leaving a
//! blank line behind. Block comments nest.

use super::{EndCodeMatch, RangeSearcher};
use crate::batch::reader::LineReader;

fn symmetric_end(reader: &LineReader<'_>, code: char) -> Option<EndCodeMatch> {
    reader
        .rest()
        .find(code)
        .map(|index| EndCodeMatch::End { index })
}

/// `'...'` string literal. A doubled `''` closes and immediately reopens
/// the range, which keeps the enclosed text opaque either way.
pub struct SqlString;

impl RangeSearcher for SqlString {
    fn start_code_length(&self) -> usize {
        1
    }

    fn end_code_length(&self) -> usize {
        1
    }

    fn is_comment(&self) -> bool {
        false
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find('\'')
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        symmetric_end(reader, '\'')
    }

    fn description(&self) -> &'static str {
        "string literal"
    }
}

/// `"..."` ANSI quoted identifier.
pub struct AnsiQuotedIdentifier;

impl RangeSearcher for AnsiQuotedIdentifier {
    fn start_code_length(&self) -> usize {
        1
    }

    fn end_code_length(&self) -> usize {
        1
    }

    fn is_comment(&self) -> bool {
        false
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find('"')
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        symmetric_end(reader, '"')
    }

    fn description(&self) -> &'static str {
        "quoted identifier"
    }
}

/// `` `...` `` MySQL quoted identifier.
pub struct BacktickIdentifier;

impl RangeSearcher for BacktickIdentifier {
    fn start_code_length(&self) -> usize {
        1
    }

    fn end_code_length(&self) -> usize {
        1
    }

    fn is_comment(&self) -> bool {
        false
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find('`')
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        symmetric_end(reader, '`')
    }

    fn description(&self) -> &'static str {
        "quoted identifier"
    }
}

/// `[...]` T-SQL quoted identifier.
pub struct BracketIdentifier;

impl RangeSearcher for BracketIdentifier {
    fn start_code_length(&self) -> usize {
        1
    }

    fn end_code_length(&self) -> usize {
        1
    }

    fn is_comment(&self) -> bool {
        false
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find('[')
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        reader
            .rest()
            .find(']')
            .map(|index| EndCodeMatch::End { index })
    }

    fn description(&self) -> &'static str {
        "bracketed identifier"
    }
}

/// `--` line comment, closed by the end of the line.
pub struct DoubleDashComment;

impl RangeSearcher for DoubleDashComment {
    fn start_code_length(&self) -> usize {
        2
    }

    fn end_code_length(&self) -> usize {
        0
    }

    fn is_comment(&self) -> bool {
        true
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find("--")
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        // The comment spans the rest of the line, terminator included.
        Some(EndCodeMatch::End {
            index: reader.length(),
        })
    }

    fn description(&self) -> &'static str {
        "line comment"
    }
}

/// `#` line comment (MySQL), closed by the end of the line.
pub struct PoundSignComment;

impl RangeSearcher for PoundSignComment {
    fn start_code_length(&self) -> usize {
        1
    }

    fn end_code_length(&self) -> usize {
        0
    }

    fn is_comment(&self) -> bool {
        true
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find('#')
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        Some(EndCodeMatch::End {
            index: reader.length(),
        })
    }

    fn description(&self) -> &'static str {
        "line comment"
    }
}

/// `/* ... */` block comment. Nests: a `/*` found while searching for the
/// end code is reported as a nested start.
pub struct MultiLineComment;

impl RangeSearcher for MultiLineComment {
    fn start_code_length(&self) -> usize {
        2
    }

    fn end_code_length(&self) -> usize {
        2
    }

    fn is_comment(&self) -> bool {
        true
    }

    fn find_start_code(&self, reader: &LineReader<'_>) -> Option<usize> {
        reader.rest().find("/*")
    }

    fn find_end_code(&self, reader: &LineReader<'_>) -> Option<EndCodeMatch> {
        let rest = reader.rest();
        match (rest.find("*/"), rest.find("/*")) {
            (Some(end), Some(nested)) if nested < end => {
                Some(EndCodeMatch::NestedStart { index: nested })
            }
            (Some(end), _) => Some(EndCodeMatch::End { index: end }),
            (None, Some(nested)) => Some(EndCodeMatch::NestedStart { index: nested }),
            (None, None) => None,
        }
    }

    fn description(&self) -> &'static str {
        "block comment"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_string_finds_start_and_end() {
        let reader = LineReader::new("SELECT 'x' FROM t\n");
        assert_eq!(SqlString.find_start_code(&reader), Some(7));
        let inside = reader.advance(8).expect("advance");
        assert_eq!(
            SqlString.find_end_code(&inside),
            Some(EndCodeMatch::End { index: 1 })
        );
    }

    #[test]
    fn line_comment_always_closes_at_end_of_line() {
        let reader = LineReader::new("-- note\n");
        assert_eq!(DoubleDashComment.find_start_code(&reader), Some(0));
        let inside = reader.advance(2).expect("advance");
        assert_eq!(
            DoubleDashComment.find_end_code(&inside),
            Some(EndCodeMatch::End { index: 6 })
        );
    }

    #[test]
    fn block_comment_reports_nested_start_first() {
        let reader = LineReader::new("a /* b */ c */\n");
        assert_eq!(
            MultiLineComment.find_end_code(&reader),
            Some(EndCodeMatch::NestedStart { index: 2 })
        );
    }

    #[test]
    fn block_comment_end_wins_when_earlier() {
        let reader = LineReader::new("b */ /* c\n");
        assert_eq!(
            MultiLineComment.find_end_code(&reader),
            Some(EndCodeMatch::End { index: 2 })
        );
    }

    #[test]
    fn block_comment_unterminated_on_this_line() {
        let reader = LineReader::new("no end here\n");
        assert_eq!(MultiLineComment.find_end_code(&reader), None);
    }

    #[test]
    fn bracket_identifier_is_asymmetric() {
        let reader = LineReader::new("SELECT [Order Details]\n");
        assert_eq!(BracketIdentifier.find_start_code(&reader), Some(7));
        let inside = reader.advance(8).expect("advance");
        assert_eq!(
            BracketIdentifier.find_end_code(&inside),
            Some(EndCodeMatch::End { index: 13 })
        );
    }
}
