//! Processor: executes operations against a live connection.
//!
//! Database drivers implement [`Processor`]; the crate ships
//! [`PreviewProcessor`], a database-free implementation that records what
//! would run. It backs dry runs and the runner's test suite.

use crate::operation::Operation;

/// Executes one operation at a time and manages transactions.
///
/// The connection is exclusively owned by the runner for the duration of a
/// run; all calls block.
pub trait Processor {
    fn begin_transaction(&mut self) -> anyhow::Result<()>;

    fn commit_transaction(&mut self) -> anyhow::Result<()>;

    fn rollback_transaction(&mut self) -> anyhow::Result<()>;

    /// Execute a single validated operation.
    fn execute(&mut self, operation: &dyn Operation) -> anyhow::Result<()>;
}

/// Everything a [`PreviewProcessor`] saw, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorEvent {
    Begin,
    Commit,
    Rollback,
    Execute(String),
}

/// A processor that records operations instead of executing them.
#[derive(Debug, Default)]
pub struct PreviewProcessor {
    events: Vec<ProcessorEvent>,
}

impl PreviewProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ProcessorEvent] {
        &self.events
    }

    /// Descriptions of the executed operations, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProcessorEvent::Execute(description) => Some(description.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Processor for PreviewProcessor {
    fn begin_transaction(&mut self) -> anyhow::Result<()> {
        self.events.push(ProcessorEvent::Begin);
        Ok(())
    }

    fn commit_transaction(&mut self) -> anyhow::Result<()> {
        self.events.push(ProcessorEvent::Commit);
        Ok(())
    }

    fn rollback_transaction(&mut self) -> anyhow::Result<()> {
        self.events.push(ProcessorEvent::Rollback);
        Ok(())
    }

    fn execute(&mut self, operation: &dyn Operation) -> anyhow::Result<()> {
        self.events
            .push(ProcessorEvent::Execute(operation.describe()));
        Ok(())
    }
}
