//! SQL batch parser.
//!
//! Splits raw SQL text into discrete executable batches. Comments and
//! quoted literals are opaque: a separator token inside them never splits.
//! The parser is a streaming lexical state machine: an explicit loop over
//! two states (idle, inside a range) plus a stack of open ranges, so
//! arbitrarily deep nesting costs no call-stack depth.
//!
//! Two notifications fire synchronously and in order while parsing:
//! [`BatchSink::sql_text`] for every emitted span and
//! [`BatchSink::special_token`] for every separator. [`BatchCollector`] is
//! the standard sink, turning the event stream into a `Vec<SqlBatch>`.

pub mod dialect;
pub mod reader;
pub mod searchers;

pub use dialect::Dialect;
pub use reader::LineReader;

use serde::Serialize;
use thiserror::Error;

use reader::lines_with_terminators;
use searchers::{EndCodeMatch, RangeSearcher, SpecialTokenSearcher, TokenMatch};

#[derive(Debug, Error)]
pub enum ParseError {
    /// A range was still open at end of input.
    #[error("unterminated {kind} at end of input")]
    UnterminatedRange { kind: &'static str },
}

/// A separator-token notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialToken {
    /// Canonical token text, e.g. `"GO"`.
    pub token: &'static str,
    /// Dialect-specific payload, e.g. the repeat count of `GO 3`.
    pub payload: Option<String>,
}

/// Receives parser notifications, in source order.
pub trait BatchSink {
    /// A span of SQL text. Spans are fragments, not statements; callers
    /// accumulate them until a separator arrives.
    fn sql_text(&mut self, text: &str);

    /// A separator token. The accumulated text before it forms one batch.
    fn special_token(&mut self, token: &SpecialToken);
}

/// One executable batch of SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlBatch {
    pub sql: String,
    /// How many times to execute the batch (from `GO <n>`; normally 1).
    pub repeat: u32,
}

/// The standard sink: accumulates text and flushes a batch per separator.
///
/// Every separator token flushes the accumulation, even a blank one; the
/// final remainder is flushed only when non-blank.
#[derive(Debug, Default)]
pub struct BatchCollector {
    current: String,
    batches: Vec<SqlBatch>,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush any non-blank remainder and return the collected batches.
    pub fn finish(mut self) -> Vec<SqlBatch> {
        if !self.current.trim().is_empty() {
            self.batches.push(SqlBatch {
                sql: std::mem::take(&mut self.current),
                repeat: 1,
            });
        }
        self.batches
    }
}

impl BatchSink for BatchCollector {
    fn sql_text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn special_token(&mut self, token: &SpecialToken) {
        let repeat = token
            .payload
            .as_deref()
            .and_then(|count| count.parse::<u32>().ok())
            .filter(|&count| count >= 1)
            .unwrap_or(1);
        self.batches.push(SqlBatch {
            sql: std::mem::take(&mut self.current),
            repeat,
        });
    }
}

/// The batch parser: a searcher set plus the comment-stripping flag.
///
/// State is created per [`parse`](BatchParser::parse) call; the parser
/// itself is reusable.
pub struct BatchParser {
    ranges: Vec<Box<dyn RangeSearcher>>,
    tokens: Vec<Box<dyn SpecialTokenSearcher>>,
    strip_comments: bool,
}

impl BatchParser {
    pub fn new(
        ranges: Vec<Box<dyn RangeSearcher>>,
        tokens: Vec<Box<dyn SpecialTokenSearcher>>,
        strip_comments: bool,
    ) -> Self {
        Self {
            ranges,
            tokens,
            strip_comments,
        }
    }

    /// Parse `source`, firing notifications into `sink`.
    ///
    /// Tie-break: a separator token matching at the same index as a range
    /// start wins; among range searchers, the first registered wins.
    pub fn parse(&self, source: &str, sink: &mut dyn BatchSink) -> Result<(), ParseError> {
        self.parse_lines(lines_with_terminators(source), sink)
    }

    /// Parse from any line source. Lines must keep their terminators
    /// attached; the iterator running out is the end of input.
    pub fn parse_lines<'s, I>(&self, lines: I, sink: &mut dyn BatchSink) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = &'s str>,
    {
        // Stack of open ranges, as indices into `self.ranges`. Only the top
        // entry's end code is searched for.
        let mut stack: Vec<usize> = Vec::new();

        for line in lines {
            let mut cursor = Some(LineReader::new(line));
            while let Some(reader) = cursor {
                cursor = match stack.last().copied() {
                    Some(open) => self.scan_in_range(&reader, open, &mut stack, sink),
                    None => self.scan_idle(&reader, &mut stack, sink),
                };
            }
        }

        if let Some(&open) = stack.last() {
            return Err(ParseError::UnterminatedRange {
                kind: self.ranges[open].description(),
            });
        }
        Ok(())
    }

    /// Parse `source` and collect the resulting batches.
    pub fn split(&self, source: &str) -> Result<Vec<SqlBatch>, ParseError> {
        let mut collector = BatchCollector::new();
        self.parse(source, &mut collector)?;
        Ok(collector.finish())
    }

    /// No range open: the earliest of any range start or separator token
    /// decides the next transition.
    fn scan_idle<'a>(
        &self,
        reader: &LineReader<'a>,
        stack: &mut Vec<usize>,
        sink: &mut dyn BatchSink,
    ) -> Option<LineReader<'a>> {
        let rest = reader.rest();

        let mut range_hit: Option<(usize, usize)> = None;
        for (searcher_index, searcher) in self.ranges.iter().enumerate() {
            if let Some(position) = searcher.find_start_code(reader)
                && range_hit.is_none_or(|(_, best)| position < best)
            {
                range_hit = Some((searcher_index, position));
            }
        }

        let mut token_hit: Option<TokenMatch> = None;
        for searcher in &self.tokens {
            if let Some(found) = searcher.find_token(reader)
                && token_hit.as_ref().is_none_or(|best| found.index < best.index)
            {
                token_hit = Some(found);
            }
        }

        // Token wins a tie with a range start.
        if let Some(token) = token_hit
            && range_hit.is_none_or(|(_, position)| token.index <= position)
        {
            if token.index > 0 {
                sink.sql_text(&rest[..token.index]);
            }
            sink.special_token(&SpecialToken {
                token: token.token,
                payload: token.payload,
            });
            return reader.advance(token.index + token.length);
        }

        if let Some((searcher_index, position)) = range_hit {
            let searcher = &self.ranges[searcher_index];
            let consumed = position + searcher.start_code_length();
            let emitted = if self.stripped(searcher.as_ref()) {
                position
            } else {
                consumed
            };
            if emitted > 0 {
                sink.sql_text(&rest[..emitted]);
            }
            stack.push(searcher_index);
            return reader.advance(consumed);
        }

        // Plain SQL to the end of the line.
        if !rest.is_empty() {
            sink.sql_text(rest);
        }
        None
    }

    /// A range is open: only its end code (or a nested start) matters.
    fn scan_in_range<'a>(
        &self,
        reader: &LineReader<'a>,
        open: usize,
        stack: &mut Vec<usize>,
        sink: &mut dyn BatchSink,
    ) -> Option<LineReader<'a>> {
        let searcher = &self.ranges[open];
        let stripped = self.stripped(searcher.as_ref());
        let rest = reader.rest();

        match searcher.find_end_code(reader) {
            None => {
                // Range stays open across the line break.
                if !stripped && !rest.is_empty() {
                    sink.sql_text(rest);
                }
                None
            }
            Some(EndCodeMatch::NestedStart { index }) => {
                let consumed = index + searcher.start_code_length();
                if !stripped {
                    sink.sql_text(&rest[..consumed]);
                }
                stack.push(open);
                reader.advance(consumed)
            }
            Some(EndCodeMatch::End { index }) => {
                let consumed = index + searcher.end_code_length();
                if !stripped && consumed > 0 {
                    sink.sql_text(&rest[..consumed]);
                }
                stack.pop();
                reader.advance(consumed)
            }
        }
    }

    fn stripped(&self, searcher: &dyn RangeSearcher) -> bool {
        self.strip_comments && searcher.is_comment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(dialect: Dialect, strip_comments: bool, source: &str) -> Vec<SqlBatch> {
        dialect
            .parser(strip_comments)
            .split(source)
            .expect("parse should succeed")
    }

    fn sql(batches: &[SqlBatch]) -> Vec<&str> {
        batches.iter().map(|batch| batch.sql.as_str()).collect()
    }

    #[test]
    fn go_splits_into_two_batches() {
        let batches = split(Dialect::SqlServer, false, "SELECT 1\nGO\nSELECT 2");
        assert_eq!(sql(&batches), vec!["SELECT 1\n", "SELECT 2"]);
        assert_eq!(batches[0].repeat, 1);
    }

    #[test]
    fn go_inside_a_line_comment_does_not_split() {
        let batches = split(Dialect::SqlServer, true, "-- GO inside a comment\nSELECT 1");
        assert_eq!(sql(&batches), vec!["SELECT 1"]);
    }

    #[test]
    fn go_inside_a_string_does_not_split() {
        let batches = split(Dialect::SqlServer, false, "SELECT 'GO'\nGO\nSELECT 2");
        assert_eq!(sql(&batches), vec!["SELECT 'GO'\n", "SELECT 2"]);
    }

    #[test]
    fn go_inside_a_block_comment_does_not_split() {
        let source = "SELECT 1\n/*\nGO\n*/\nGO\nSELECT 2";
        let batches = split(Dialect::SqlServer, true, source);
        assert_eq!(sql(&batches), vec!["SELECT 1\n\n", "SELECT 2"]);
    }

    #[test]
    fn unterminated_block_comment_is_fatal() {
        let err = Dialect::SqlServer
            .parser(false)
            .split("/* never closes")
            .expect_err("must fail");
        assert!(matches!(err, ParseError::UnterminatedRange { kind } if kind == "block comment"));
    }

    #[test]
    fn unterminated_string_is_fatal() {
        let err = Dialect::Ansi
            .parser(false)
            .split("SELECT 'oops\n")
            .expect_err("must fail");
        assert!(
            matches!(err, ParseError::UnterminatedRange { kind } if kind == "string literal")
        );
    }

    #[test]
    fn nested_block_comments_must_all_close() {
        let batches = split(
            Dialect::SqlServer,
            true,
            "SELECT 1 /* outer /* inner */ still outer */\nGO\n",
        );
        assert_eq!(sql(&batches), vec!["SELECT 1 \n"]);

        let err = Dialect::SqlServer
            .parser(true)
            .split("/* outer /* inner */ still open")
            .expect_err("outer comment never closes");
        assert!(matches!(err, ParseError::UnterminatedRange { .. }));
    }

    #[test]
    fn comments_are_kept_when_stripping_is_off() {
        let source = "SELECT 1 -- keep me\nGO\n";
        let batches = split(Dialect::SqlServer, false, source);
        assert_eq!(sql(&batches), vec!["SELECT 1 -- keep me\n"]);
    }

    #[test]
    fn stripped_full_line_comment_leaves_no_blank_line() {
        let batches = split(Dialect::SqlServer, true, "-- header\n-- header 2\nSELECT 1");
        assert_eq!(sql(&batches), vec!["SELECT 1"]);
    }

    #[test]
    fn go_with_count_sets_the_repeat() {
        let batches = split(Dialect::SqlServer, false, "INSERT INTO t DEFAULT VALUES\nGO 3\n");
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].sql, "INSERT INTO t DEFAULT VALUES\n");
        assert_eq!(batches[0].repeat, 3);
    }

    #[test]
    fn consecutive_separators_flush_blank_batches() {
        let batches = split(Dialect::SqlServer, false, "SELECT 1\nGO\nGO\n");
        assert_eq!(sql(&batches), vec!["SELECT 1\n", ""]);
    }

    #[test]
    fn trailing_blank_remainder_is_not_flushed() {
        let batches = split(Dialect::SqlServer, false, "SELECT 1\nGO\n   \n");
        assert_eq!(sql(&batches), vec!["SELECT 1\n"]);
    }

    #[test]
    fn semicolon_splits_ansi_statements() {
        let batches = split(Dialect::Ansi, false, "SELECT 1; SELECT 2;");
        assert_eq!(sql(&batches), vec!["SELECT 1", " SELECT 2"]);
    }

    #[test]
    fn semicolon_inside_a_string_does_not_split() {
        let batches = split(Dialect::Ansi, false, "SELECT 'a;b'");
        assert_eq!(sql(&batches), vec!["SELECT 'a;b'"]);
    }

    #[test]
    fn doubled_quotes_keep_the_string_opaque() {
        let batches = split(Dialect::Ansi, false, "SELECT 'it''s;fine'");
        assert_eq!(sql(&batches), vec!["SELECT 'it''s;fine'"]);
    }

    #[test]
    fn crlf_go_line_is_consumed_entirely() {
        let batches = split(Dialect::SqlServer, false, "SELECT 1\r\nGO\r\nSELECT 2\r\n");
        assert_eq!(sql(&batches), vec!["SELECT 1\r\n", "SELECT 2\r\n"]);
    }

    #[test]
    fn pound_comment_is_mysql_only() {
        let batches = split(Dialect::MySql, true, "# note\nSELECT 1");
        assert_eq!(sql(&batches), vec!["SELECT 1"]);

        let batches = split(Dialect::SqlServer, true, "# not a comment\nGO\n");
        assert_eq!(sql(&batches), vec!["# not a comment\n"]);
    }

    #[test]
    fn bracketed_identifier_hides_a_go_line() {
        // A bracketed identifier spanning the GO line keeps it opaque.
        let batches = split(Dialect::SqlServer, false, "SELECT [weird\nGO\nname] FROM t");
        assert_eq!(sql(&batches), vec!["SELECT [weird\nGO\nname] FROM t"]);
    }

    #[test]
    fn parse_lines_accepts_any_line_source() {
        let lines = vec!["SELECT 1\n", "GO\n", "SELECT 2\n"];
        let mut collector = BatchCollector::new();
        Dialect::SqlServer
            .parser(false)
            .parse_lines(lines, &mut collector)
            .expect("parse");
        assert_eq!(sql(&collector.finish()), vec!["SELECT 1\n", "SELECT 2\n"]);
    }

    #[test]
    fn multi_line_string_keeps_its_line_breaks() {
        let batches = split(Dialect::Ansi, false, "INSERT INTO t VALUES ('line1\nline2')");
        assert_eq!(sql(&batches), vec!["INSERT INTO t VALUES ('line1\nline2')"]);
    }
}
