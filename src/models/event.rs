use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The interaction kinds the collector observes.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    Blur,
    Input,
    Submit,
    Pageview,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::Input => "input",
            EventKind::Submit => "submit",
            EventKind::Pageview => "pageview",
        }
    }

    pub fn parse(value: &str) -> Option<EventKind> {
        match value {
            "focus" => Some(EventKind::Focus),
            "blur" => Some(EventKind::Blur),
            "input" => Some(EventKind::Input),
            "submit" => Some(EventKind::Submit),
            "pageview" => Some(EventKind::Pageview),
            _ => None,
        }
    }

    /// Submit and pageview events are form-level; they never carry a field name.
    pub fn carries_field(&self) -> bool {
        matches!(self, EventKind::Focus | EventKind::Blur | EventKind::Input)
    }
}

/// One observed interaction, as captured by the agent or decoded off the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedEvent {
    pub kind: EventKind,
    pub field_name: Option<String>,
    pub duration_ms: Option<i64>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub page_url: Option<String>,
}

impl TrackedEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            field_name: None,
            duration_ms: None,
            occurred_at: None,
            page_url: None,
        }
    }
}

/// An ordered group of events accumulated between flush points.
#[derive(Clone, Debug, PartialEq)]
pub struct EventBatch {
    pub project_id: String,
    pub session_id: String,
    pub events: Vec<TrackedEvent>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Request-derived metadata attached to every record in a batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestMeta {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// The normalized persisted form of one event.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub project_id: String,
    pub session_id: String,
    pub event_type: String,
    pub field_name: Option<String>,
    pub duration_ms: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub page_url: Option<String>,
}

/// Maps a batch to stored records, preserving event order. Events without a
/// client timestamp default to the receipt time.
pub fn normalize_batch(
    batch: &EventBatch,
    meta: &RequestMeta,
    received_at: DateTime<Utc>,
) -> Vec<EventRecord> {
    batch
        .events
        .iter()
        .map(|event| EventRecord {
            project_id: batch.project_id.clone(),
            session_id: batch.session_id.clone(),
            event_type: event.kind.as_str().to_string(),
            field_name: if event.kind.carries_field() {
                event.field_name.clone()
            } else {
                None
            },
            duration_ms: event.duration_ms,
            timestamp: event.occurred_at.unwrap_or(received_at),
            user_agent: meta.user_agent.clone(),
            ip_address: meta.ip_address.clone(),
            page_url: event.page_url.clone(),
        })
        .collect()
}
