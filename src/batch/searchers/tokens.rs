//! Special-token searchers: the batch separators.

use std::sync::LazyLock;

use regex::Regex;

use super::{SpecialTokenSearcher, TokenMatch};
use crate::batch::reader::LineReader;

/// A `GO` line: optional leading whitespace, case-insensitive `GO`, an
/// optional repeat count, optional trailing whitespace, end of line.
static GO_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\A[ \t]*GO(?:[ \t]+(?<count>\d+))?[ \t]*\r?\n?\z")
        .expect("GO separator pattern is valid")
});

/// T-SQL `GO` separator. Matches only when the whole remainder of the line
/// is a standalone `GO`, consuming it entirely; the repeat count of
/// `GO <n>` becomes the token payload.
pub struct GoSearcher;

impl SpecialTokenSearcher for GoSearcher {
    fn find_token(&self, reader: &LineReader<'_>) -> Option<TokenMatch> {
        let rest = reader.rest();
        let captures = GO_LINE.captures(rest)?;
        Some(TokenMatch {
            index: 0,
            length: rest.len(),
            token: "GO",
            payload: captures.name("count").map(|m| m.as_str().to_string()),
        })
    }
}

/// A bare `;` separator, anywhere outside a range.
pub struct SemicolonSearcher;

impl SpecialTokenSearcher for SemicolonSearcher {
    fn find_token(&self, reader: &LineReader<'_>) -> Option<TokenMatch> {
        reader.rest().find(';').map(|index| TokenMatch {
            index,
            length: 1,
            token: ";",
            payload: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_matches_a_standalone_line() {
        let reader = LineReader::new("GO\n");
        let m = GoSearcher.find_token(&reader).expect("match");
        assert_eq!(m.index, 0);
        assert_eq!(m.length, 3);
        assert_eq!(m.token, "GO");
        assert_eq!(m.payload, None);
    }

    #[test]
    fn go_is_case_insensitive_and_tolerates_whitespace() {
        let reader = LineReader::new("  go  \r\n");
        let m = GoSearcher.find_token(&reader).expect("match");
        assert_eq!(m.length, 8);
    }

    #[test]
    fn go_with_count_carries_the_payload() {
        let reader = LineReader::new("GO 3\n");
        let m = GoSearcher.find_token(&reader).expect("match");
        assert_eq!(m.payload.as_deref(), Some("3"));
    }

    #[test]
    fn go_with_trailing_content_is_not_a_separator() {
        assert!(
            GoSearcher
                .find_token(&LineReader::new("GO TO work\n"))
                .is_none()
        );
        assert!(
            GoSearcher
                .find_token(&LineReader::new("SELECT 1 GO\n"))
                .is_none()
        );
    }

    #[test]
    fn go_matches_at_end_of_input_without_newline() {
        let reader = LineReader::new("GO");
        assert!(GoSearcher.find_token(&reader).is_some());
    }

    #[test]
    fn semicolon_matches_mid_line() {
        let reader = LineReader::new("SELECT 1; SELECT 2\n");
        let m = SemicolonSearcher.find_token(&reader).expect("match");
        assert_eq!(m.index, 8);
        assert_eq!(m.length, 1);
    }
}
