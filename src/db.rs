pub mod event_record;
pub mod memory;

use async_trait::async_trait;

use crate::models::EventRecord;

/// Append-only sink for normalized event records. The pipeline has no read
/// path; dashboards query the store directly.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, records: Vec<EventRecord>) -> anyhow::Result<()>;
}
