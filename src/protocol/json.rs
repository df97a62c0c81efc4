//! The two JSON wire shapes: the full field names and the shortened ones.
//! Both arrive as `application/json`; the full shape is tried first.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::ParseError;
use crate::models::{EventBatch, EventKind, TrackedEvent};

#[derive(Deserialize, Serialize, Debug)]
struct FullBatch {
    pid: String,
    sid: String,
    #[serde(default)]
    events: Vec<FullEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
struct FullEvent {
    evt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fld: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dur: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
struct CompactBatch {
    p: String,
    s: String,
    #[serde(default)]
    d: Vec<CompactEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    t: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug)]
struct CompactEvent {
    e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

fn millis_to_utc(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.and_then(|value| Utc.timestamp_millis_opt(value).single())
}

fn utc_to_millis(timestamp: Option<DateTime<Utc>>) -> Option<i64> {
    timestamp.map(|value| value.timestamp_millis())
}

fn parse_kind(value: &str) -> Result<EventKind, ParseError> {
    EventKind::parse(value).ok_or_else(|| ParseError::UnknownEventKind(value.to_string()))
}

pub fn parse(body: &[u8]) -> Result<EventBatch, ParseError> {
    if let Ok(full) = serde_json::from_slice::<FullBatch>(body) {
        return batch_from_full(full);
    }

    let compact = serde_json::from_slice::<CompactBatch>(body)?;
    batch_from_compact(compact)
}

fn batch_from_full(wire: FullBatch) -> Result<EventBatch, ParseError> {
    let events = wire
        .events
        .into_iter()
        .map(|event| {
            Ok(TrackedEvent {
                kind: parse_kind(&event.evt)?,
                field_name: event.fld,
                duration_ms: event.dur,
                occurred_at: millis_to_utc(event.t),
                page_url: None,
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(EventBatch {
        project_id: wire.pid,
        session_id: wire.sid,
        events,
        sent_at: millis_to_utc(wire.ts),
    })
}

fn batch_from_compact(wire: CompactBatch) -> Result<EventBatch, ParseError> {
    let events = wire
        .d
        .into_iter()
        .map(|event| {
            Ok(TrackedEvent {
                kind: parse_kind(&event.e)?,
                field_name: event.n,
                duration_ms: event.x,
                occurred_at: millis_to_utc(event.ts),
                page_url: event.url,
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    Ok(EventBatch {
        project_id: wire.p,
        session_id: wire.s,
        events,
        sent_at: millis_to_utc(wire.t),
    })
}

pub fn encode_full(batch: &EventBatch) -> Result<Vec<u8>, serde_json::Error> {
    let wire = FullBatch {
        pid: batch.project_id.clone(),
        sid: batch.session_id.clone(),
        events: batch
            .events
            .iter()
            .map(|event| FullEvent {
                evt: event.kind.as_str().to_string(),
                fld: event.field_name.clone(),
                dur: event.duration_ms,
                t: utc_to_millis(event.occurred_at),
            })
            .collect(),
        ts: utc_to_millis(batch.sent_at),
    };

    serde_json::to_vec(&wire)
}

pub fn encode_compact(batch: &EventBatch) -> Result<Vec<u8>, serde_json::Error> {
    let wire = CompactBatch {
        p: batch.project_id.clone(),
        s: batch.session_id.clone(),
        d: batch
            .events
            .iter()
            .map(|event| CompactEvent {
                e: event.kind.as_str().to_string(),
                n: event.field_name.clone(),
                x: event.duration_ms,
                ts: utc_to_millis(event.occurred_at),
                url: event.page_url.clone(),
            })
            .collect(),
        t: utc_to_millis(batch.sent_at),
    };

    serde_json::to_vec(&wire)
}
