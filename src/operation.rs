//! Abstract schema/data change operations.
//!
//! The runner never interprets an operation beyond defaulting and
//! validation; execution is the [`Processor`](crate::processor::Processor)'s
//! job. [`RawSqlOperation`] is the one concrete operation shipped with the
//! crate: a SQL script that is batch-checked at validation time so that an
//! unterminated comment or string literal is caught before anything runs.

use crate::batch::{Dialect, SqlBatch};

/// One schema or data change.
pub trait Operation {
    /// Fill convention-based values that the author left unset. Runs before
    /// [`validate`](Operation::validate).
    fn apply_defaults(&mut self) {}

    /// All problems with this operation. An empty list means it is valid.
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }

    /// Short human-readable description for logs and dry-run output.
    fn describe(&self) -> String;
}

/// An operation carrying a raw SQL script.
///
/// Validation runs the batch parser over the script, so scripts with
/// unterminated ranges are rejected before any database work starts.
#[derive(Debug, Clone)]
pub struct RawSqlOperation {
    script: String,
    dialect: Option<Dialect>,
}

impl RawSqlOperation {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            dialect: None,
        }
    }

    pub fn with_dialect(script: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            script: script.into(),
            dialect: Some(dialect),
        }
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// The dialect the script will be split with. Filled by
    /// [`apply_defaults`](Operation::apply_defaults) when unset.
    pub fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    /// Split the script into executable batches.
    pub fn batches(&self) -> Result<Vec<SqlBatch>, crate::batch::ParseError> {
        self.dialect().parser(false).split(&self.script)
    }
}

impl Operation for RawSqlOperation {
    fn apply_defaults(&mut self) {
        if self.dialect.is_none() {
            self.dialect = Some(Dialect::default());
        }
    }

    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.script.trim().is_empty() {
            errors.push("SQL script is empty".to_string());
        } else if let Err(err) = self.batches() {
            errors.push(format!("SQL script does not parse: {err}"));
        }
        errors
    }

    fn describe(&self) -> String {
        let first_line = self
            .script
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("");
        let mut shown: String = first_line.chars().take(60).collect();
        if shown.len() < first_line.len() {
            shown.push('…');
        }
        format!("sql: {shown}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_defaults_fills_the_dialect() {
        let mut op = RawSqlOperation::new("SELECT 1");
        op.apply_defaults();
        assert_eq!(op.dialect(), Dialect::Ansi);
    }

    #[test]
    fn explicit_dialect_survives_apply_defaults() {
        let mut op = RawSqlOperation::with_dialect("SELECT 1", Dialect::SqlServer);
        op.apply_defaults();
        assert_eq!(op.dialect(), Dialect::SqlServer);
    }

    #[test]
    fn empty_script_fails_validation() {
        let op = RawSqlOperation::new("   \n  ");
        let errors = op.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("empty"));
    }

    #[test]
    fn unterminated_comment_fails_validation() {
        let op = RawSqlOperation::new("SELECT 1 /* never closes");
        let errors = op.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("does not parse"), "got: {}", errors[0]);
    }

    #[test]
    fn describe_uses_the_first_non_blank_line() {
        let op = RawSqlOperation::new("\n  CREATE TABLE users (id bigint)\nGO\n");
        assert_eq!(op.describe(), "sql: CREATE TABLE users (id bigint)");
    }
}
