pub mod event;

pub use event::{normalize_batch, EventBatch, EventKind, EventRecord, RequestMeta, TrackedEvent};
