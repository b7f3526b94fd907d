//! Query Service and Ingestion Endpoint.

mod ingest;
mod query;

pub use ingest::{IngestionService, SaveOutcome};
pub use query::{MessagePage, QueryOutcome, QueryService};

#[cfg(test)]
mod services_test;
