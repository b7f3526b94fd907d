//! Result of an idempotent upsert keyed by `message_id`.

use serde::{Deserialize, Serialize};

/// What a single upsert did to the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertOutcome {
    /// No document with this `message_id` existed.
    Inserted,
    /// An existing document had different content and was overwritten.
    Updated,
    /// Matched an identical document; nothing was written.
    Unchanged,
}

impl UpsertOutcome {
    pub fn inserted(&self) -> bool {
        matches!(self, Self::Inserted)
    }

    pub fn updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Per-batch (or accumulated) upsert counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
}

impl BatchOutcome {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn merge(&mut self, other: &BatchOutcome) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }

    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.unchanged
    }
}
