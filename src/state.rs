use std::sync::Arc;

use crate::db::EventStore;

/// Shared handler state. The store sits behind a trait object so the test
/// suite can run the full router against an in-memory store.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }
}
