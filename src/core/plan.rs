//! Import plan types

use serde_json::{Map, Value};

use crate::core::collection::Collection;
use crate::core::error::RowError;
use crate::notion::RemoteId;

/// Target of a relation property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Record that exists remotely
    Existing(RemoteId),
    /// Record planned for creation earlier in the same run
    Pending { collection: Collection, key: String },
}

/// Relation property to fill in before insert
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRef {
    pub property: String,
    pub target: Reference,
}

/// Properties of a record to create
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payload {
    pub properties: Map<String, Value>,
    pub relations: Vec<RelationRef>,
}

/// What to do with one source row
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Skip(RemoteId),
    Create(Payload),
    Error(RowError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub collection: Collection,
    /// Source line in the CSV file
    pub line: u64,
    /// Natural key, empty when the row has none
    pub key: String,
    pub action: Action,
}

/// Create/skip/error counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    pub create: usize,
    pub skip: usize,
    pub error: usize,
}

/// Ordered list of actions for a run
#[derive(Debug, Clone, Default)]
pub struct Plan {
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: PlanEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn counts(&self, collection: Collection) -> ActionCounts {
        self.count_where(|e| e.collection == collection)
    }

    pub fn totals(&self) -> ActionCounts {
        self.count_where(|_| true)
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.action, Action::Error(_)))
    }

    /// True when no entry precedes an entry of a collection it depends on
    pub fn is_dependency_ordered(&self) -> bool {
        let rank = |c: Collection| {
            Collection::IMPORT_ORDER
                .iter()
                .position(|o| *o == c)
                .unwrap_or(usize::MAX)
        };
        self.entries
            .windows(2)
            .all(|w| rank(w[0].collection) <= rank(w[1].collection))
    }

    fn count_where(&self, pred: impl Fn(&PlanEntry) -> bool) -> ActionCounts {
        let mut counts = ActionCounts::default();
        for entry in self.entries.iter().filter(|e| pred(e)) {
            match entry.action {
                Action::Skip(_) => counts.skip += 1,
                Action::Create(_) => counts.create += 1,
                Action::Error(_) => counts.error += 1,
            }
        }
        counts
    }
}
