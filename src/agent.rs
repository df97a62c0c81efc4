//! The client collector agent: turns form activity into a batched,
//! best-effort delivered event stream. Nothing in here may panic or surface
//! an error into the embedding page; a misconfigured agent degrades to a
//! no-op and a failed delivery is silently dropped.

pub mod batcher;
pub mod field;
pub mod session;
pub mod transport;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::models::{EventKind, TrackedEvent};
use crate::protocol::WireFormat;
use batcher::Batcher;
use field::FieldDescriptor;
use session::new_session_id;
use transport::Transport;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

pub struct AgentConfig {
    /// Tenant identifier from the embedding script tag. Absence disables the
    /// agent entirely.
    pub project_id: Option<String>,
    pub endpoint: String,
    pub format: WireFormat,
    pub quiet_period: Duration,
    pub page_url: Option<String>,
}

impl AgentConfig {
    pub fn new(project_id: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            project_id,
            endpoint: endpoint.into(),
            format: WireFormat::Json,
            quiet_period: DEFAULT_QUIET_PERIOD,
            page_url: None,
        }
    }
}

pub struct CollectorAgent {
    inner: Option<AgentInner>,
}

struct AgentInner {
    batcher: Arc<Batcher>,
    session_id: String,
    page_url: Option<String>,
    wired: Mutex<HashSet<String>>,
    focus_started: Mutex<HashMap<String, Instant>>,
}

impl CollectorAgent {
    /// Builds the agent and records the initial pageview. Without a project
    /// id every later call is a no-op.
    pub fn init(config: AgentConfig, transport: Arc<dyn Transport>) -> Self {
        let Some(project_id) = config.project_id.filter(|id| !id.is_empty()) else {
            return Self { inner: None };
        };

        let session_id = new_session_id();
        let batcher = Batcher::new(
            project_id,
            session_id.clone(),
            config.endpoint,
            config.format,
            config.quiet_period,
            transport,
        );

        let agent = Self {
            inner: Some(AgentInner {
                batcher,
                session_id,
                page_url: config.page_url,
                wired: Mutex::new(HashSet::new()),
                focus_started: Mutex::new(HashMap::new()),
            }),
        };

        agent.enqueue(EventKind::Pageview, None, None);
        agent
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.inner.as_ref().map(|inner| inner.session_id.as_str())
    }

    /// Marks an element as instrumented. Returns false when the element was
    /// already wired, so rescans after DOM mutations attach nothing twice.
    pub fn wire_field(&self, element_key: &str) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        inner.wired.lock().unwrap().insert(element_key.to_string())
    }

    /// Re-runs wiring over the currently known elements, returning how many
    /// were newly wired. The mutation-observer re-initialization path.
    pub fn rescan<'a>(&self, element_keys: impl IntoIterator<Item = &'a str>) -> usize {
        element_keys
            .into_iter()
            .filter(|key| self.wire_field(key))
            .count()
    }

    pub fn field_focused(&self, descriptor: &FieldDescriptor) {
        let Some(inner) = &self.inner else {
            return;
        };
        let identity = descriptor.identity();
        inner
            .focus_started
            .lock()
            .unwrap()
            .insert(identity.clone(), Instant::now());
        self.enqueue(EventKind::Focus, Some(identity), None);
    }

    /// Blur closes out the focus span; the elapsed time becomes the event's
    /// duration when a matching focus was seen.
    pub fn field_blurred(&self, descriptor: &FieldDescriptor) {
        let Some(inner) = &self.inner else {
            return;
        };
        let identity = descriptor.identity();
        let duration_ms = inner
            .focus_started
            .lock()
            .unwrap()
            .remove(&identity)
            .map(|started| started.elapsed().as_millis() as i64);
        self.enqueue(EventKind::Blur, Some(identity), duration_ms);
    }

    pub fn field_input(&self, descriptor: &FieldDescriptor) {
        self.enqueue(EventKind::Input, Some(descriptor.identity()), None);
    }

    pub fn form_submitted(&self) {
        self.enqueue(EventKind::Submit, None, None);
    }

    /// Unload trigger: flush immediately, ahead of any pending timer.
    pub fn page_unloading(&self) {
        if let Some(inner) = &self.inner {
            inner.batcher.flush();
        }
    }

    /// Visibility-hidden trigger, same contract as unload.
    pub fn visibility_hidden(&self) {
        self.page_unloading();
    }

    fn enqueue(&self, kind: EventKind, field_name: Option<String>, duration_ms: Option<i64>) {
        let Some(inner) = &self.inner else {
            return;
        };

        let event = TrackedEvent {
            kind,
            field_name,
            duration_ms,
            occurred_at: Some(chrono::Utc::now()),
            page_url: inner.page_url.clone(),
        };
        inner.batcher.enqueue(event);
    }
}
