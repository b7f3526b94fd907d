mod message_record;
mod upsert_outcome;

pub use message_record::MessageRecord;
pub use upsert_outcome::{BatchOutcome, UpsertOutcome};
