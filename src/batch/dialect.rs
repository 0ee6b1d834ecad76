//! Dialect presets: the searcher sets each SQL flavor ships with.

use strum_macros::{EnumIter, EnumString, IntoStaticStr, VariantNames};

use super::BatchParser;
use super::searchers::ranges::{
    AnsiQuotedIdentifier, BacktickIdentifier, BracketIdentifier, DoubleDashComment,
    MultiLineComment, PoundSignComment, SqlString,
};
use super::searchers::tokens::{GoSearcher, SemicolonSearcher};
use super::searchers::{RangeSearcher, SpecialTokenSearcher};

/// A SQL dialect, naming the range and separator searchers to parse with.
///
/// Searcher registration order is significant: when two range searchers
/// match at the same index, the first registered wins.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    EnumString,
    IntoStaticStr,
    VariantNames,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Dialect {
    /// T-SQL: bracketed identifiers, batches separated by standalone `GO`.
    SqlServer,
    /// MySQL: backtick identifiers and `#` comments, `;` separators.
    MySql,
    /// Plain ANSI SQL, split on `;`.
    #[default]
    Ansi,
}

impl Dialect {
    pub fn range_searchers(self) -> Vec<Box<dyn RangeSearcher>> {
        match self {
            Dialect::SqlServer => vec![
                Box::new(MultiLineComment),
                Box::new(DoubleDashComment),
                Box::new(SqlString),
                Box::new(BracketIdentifier),
                Box::new(AnsiQuotedIdentifier),
            ],
            Dialect::MySql => vec![
                Box::new(MultiLineComment),
                Box::new(DoubleDashComment),
                Box::new(PoundSignComment),
                Box::new(SqlString),
                Box::new(AnsiQuotedIdentifier),
                Box::new(BacktickIdentifier),
            ],
            Dialect::Ansi => vec![
                Box::new(MultiLineComment),
                Box::new(DoubleDashComment),
                Box::new(SqlString),
                Box::new(AnsiQuotedIdentifier),
            ],
        }
    }

    pub fn token_searchers(self) -> Vec<Box<dyn SpecialTokenSearcher>> {
        match self {
            Dialect::SqlServer => vec![Box::new(GoSearcher)],
            Dialect::MySql | Dialect::Ansi => vec![Box::new(SemicolonSearcher)],
        }
    }

    /// A batch parser preloaded with this dialect's searchers.
    pub fn parser(self, strip_comments: bool) -> BatchParser {
        BatchParser::new(self.range_searchers(), self.token_searchers(), strip_comments)
    }
}
