use std::sync::{Arc, Mutex};
use std::time::Duration;

use formpulse::agent::field::FieldDescriptor;
use formpulse::agent::transport::{HttpTransport, Transport};
use formpulse::agent::{AgentConfig, CollectorAgent};
use formpulse::models::{EventBatch, EventKind};
use formpulse::protocol::{parse_batch, Payload};

/// Captures deliveries synchronously instead of sending them anywhere.
#[derive(Default)]
struct RecordingTransport {
    deliveries: Mutex<Vec<Payload>>,
}

impl RecordingTransport {
    fn deliveries(&self) -> Vec<Payload> {
        self.deliveries.lock().unwrap().clone()
    }

    fn batches(&self) -> Vec<EventBatch> {
        self.deliveries()
            .iter()
            .map(|payload| match payload {
                Payload::Post { content_type, body } => {
                    parse_batch(Some(content_type), body).unwrap()
                }
                Payload::Get { .. } => panic!("agent tests use POST formats"),
            })
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn deliver(&self, _endpoint: &str, payload: Payload) {
        self.deliveries.lock().unwrap().push(payload);
    }
}

fn agent_with(transport: Arc<RecordingTransport>) -> CollectorAgent {
    CollectorAgent::init(
        AgentConfig::new(Some("p1".to_string()), "https://collector.example/collect"),
        transport,
    )
}

#[tokio::test(start_paused = true)]
async fn rapid_events_coalesce_into_a_single_delivery() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = agent_with(transport.clone());

    for name in ["f1", "f2", "f3", "f4", "f5"] {
        agent.field_input(&FieldDescriptor::named(name));
        // well inside the 300ms quiet period, so the timer keeps resetting
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;

    let batches = transport.batches();
    assert_eq!(batches.len(), 1, "bursts must produce exactly one flush");

    let events = &batches[0].events;
    assert_eq!(events.len(), 6); // initial pageview + five inputs
    assert_eq!(events[0].kind, EventKind::Pageview);
    let names: Vec<_> = events[1..]
        .iter()
        .map(|e| e.field_name.clone().unwrap())
        .collect();
    assert_eq!(names, vec!["f1", "f2", "f3", "f4", "f5"]);
}

#[tokio::test(start_paused = true)]
async fn unload_flushes_ahead_of_the_timer_without_duplicates() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = agent_with(transport.clone());

    agent.field_input(&FieldDescriptor::named("email"));
    agent.page_unloading();

    assert_eq!(transport.deliveries().len(), 1);

    // the pending debounce timer fires into an empty queue
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(transport.deliveries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn a_flushed_batch_is_never_mutated_by_later_events() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = agent_with(transport.clone());

    agent.field_input(&FieldDescriptor::named("first"));
    agent.page_unloading();
    agent.field_input(&FieldDescriptor::named("second"));
    agent.page_unloading();

    let batches = transport.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].events.len(), 2); // pageview + first
    assert!(batches[0]
        .events
        .iter()
        .all(|e| e.field_name.as_deref() != Some("second")));
    assert_eq!(batches[1].events.len(), 1);
    assert_eq!(batches[1].events[0].field_name.as_deref(), Some("second"));
}

#[tokio::test(start_paused = true)]
async fn blur_carries_time_on_field() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = agent_with(transport.clone());
    let email = FieldDescriptor::named("email");

    agent.field_focused(&email);
    tokio::time::sleep(Duration::from_millis(2000)).await;
    agent.field_blurred(&email);
    agent.page_unloading();

    let batches = transport.batches();
    let blur = batches
        .iter()
        .flat_map(|b| &b.events)
        .find(|e| e.kind == EventKind::Blur)
        .unwrap();
    assert_eq!(blur.duration_ms, Some(2000));
}

#[tokio::test(start_paused = true)]
async fn visibility_hidden_flushes_like_unload() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = agent_with(transport.clone());

    agent.form_submitted();
    agent.visibility_hidden();

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    assert!(batches[0]
        .events
        .iter()
        .any(|e| e.kind == EventKind::Submit && e.field_name.is_none()));
}

#[tokio::test(start_paused = true)]
async fn missing_project_id_disables_the_agent() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = CollectorAgent::init(
        AgentConfig::new(None, "https://collector.example/collect"),
        transport.clone(),
    );

    assert!(!agent.is_enabled());
    assert_eq!(agent.session_id(), None);
    agent.field_input(&FieldDescriptor::named("email"));
    agent.page_unloading();
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(transport.deliveries().is_empty());
}

#[tokio::test(start_paused = true)]
async fn elements_are_wired_exactly_once() {
    let transport = Arc::new(RecordingTransport::default());
    let agent = agent_with(transport);
    assert!(agent.session_id().is_some());

    assert!(agent.wire_field("form0/input0"));
    assert!(!agent.wire_field("form0/input0"));

    // a rescan after new nodes appear only wires the unseen ones
    let newly_wired = agent.rescan(["form0/input0", "form0/input1", "form1/input0"]);
    assert_eq!(newly_wired, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn http_transport_delivers_to_a_live_collector() {
    use httpmock::prelude::*;

    let server = MockServer::start_async().await;
    let collect = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/collect")
                .header("content-type", "application/json");
            then.status(204);
        })
        .await;

    let agent = CollectorAgent::init(
        AgentConfig::new(Some("p1".to_string()), server.url("/collect")),
        Arc::new(HttpTransport::new()),
    );
    agent.field_input(&FieldDescriptor::named("email"));
    agent.page_unloading();

    for _ in 0..100 {
        if collect.hits_async().await >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(collect.hits_async().await >= 1);
}
