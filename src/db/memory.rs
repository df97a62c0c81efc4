//! In-memory stores used by the test suite in place of Postgres.

use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use super::EventStore;
use crate::models::EventRecord;

/// Records every appended batch.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EventRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn append(&self, records: Vec<EventRecord>) -> anyhow::Result<()> {
        self.records.lock().unwrap().extend(records);
        Ok(())
    }
}

/// Fails every append, for exercising the write-failure path.
pub struct FailingStore;

#[async_trait]
impl EventStore for FailingStore {
    async fn append(&self, _records: Vec<EventRecord>) -> anyhow::Result<()> {
        Err(anyhow!("store unavailable"))
    }
}
