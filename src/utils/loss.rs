//! Loss reporting for lossy chart parsing.
//!
//! The chart model only keeps a fixed option vocabulary. Anything else is
//! dropped; the report records what was dropped so a host can warn.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossKind {
    /// An axis or series option outside the recognized vocabulary
    UnknownOption,
    /// A command inside the axis environment that is not a series
    UnknownCommand,
    /// A `table {\name}` reference with no matching table
    UnresolvedTable,
    /// A series whose payload could not be read
    EmptyPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LossRecord {
    pub kind: LossKind,
    /// Option key or command name
    pub name: String,
    /// Where it appeared, e.g. `axis` or `series 2`
    pub context: String,
}

impl LossRecord {
    pub fn new(kind: LossKind, name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            context: context.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LossReport {
    pub losses: Vec<LossRecord>,
}

impl LossReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: LossKind, name: impl Into<String>, context: impl Into<String>) {
        let record = LossRecord::new(kind, name, context);
        tracing::debug!(kind = ?record.kind, name = %record.name, context = %record.context, "dropped");
        self.losses.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.losses.iter().map(|l| l.name.as_str()).collect()
    }
}
