//! Versioned records driven by commands.

use crate::error::{DomainError, DomainResult};

/// A record with a stable identity and a write counter.
pub trait AggregateRoot {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Number of state changes applied since the record was created.
    fn version(&self) -> u64;
}

/// Version a conditional write expects to find in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Write against whatever is stored; only the command's preconditions guard it.
    Any,
    /// Write only if storage still holds this version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(expected) => expected == actual,
        }
    }

    /// `Conflict` when the stored version moved on.
    pub fn check(self, actual: u64) -> DomainResult<()> {
        match self {
            ExpectedVersion::Exact(expected) if expected != actual => Err(DomainError::conflict(
                format!("stale write: expected version {expected}, stored version is {actual}"),
            )),
            _ => Ok(()),
        }
    }
}

impl From<Option<u64>> for ExpectedVersion {
    fn from(value: Option<u64>) -> Self {
        value.map_or(ExpectedVersion::Any, ExpectedVersion::Exact)
    }
}

/// Command handling split into a pure decision and a state fold.
///
/// `handle` validates the command against current state and returns the
/// resulting events without touching `self`; `apply` folds one event in and
/// bumps the version.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    fn apply(&mut self, event: &Self::Event);

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// `handle`, then `apply` every resulting event. State is untouched on error.
    fn execute(&mut self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = self.handle(command)?;
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }
}
