//! The query-string pixel shape: one event per GET against an endpoint that
//! answers with a 1x1 image. The fallback of last resort when POST delivery
//! is filtered out.

use serde::Deserialize;

use super::{ParseError, Payload};
use crate::models::{EventBatch, EventKind, TrackedEvent};

/// Query parameters of a pixel hit. Every field decodes as a string so that
/// extraction can never fail upstream of the handler; the pixel route must
/// answer with the image no matter what arrives.
#[derive(Deserialize, Debug, Default)]
pub struct PixelParams {
    pub i: Option<String>,
    pub s: Option<String>,
    pub e: Option<String>,
    pub n: Option<String>,
    pub d: Option<String>,
}

pub fn parse(params: &PixelParams) -> Result<EventBatch, ParseError> {
    let project_id = params
        .i
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or(ParseError::MissingField("i"))?;
    let session_id = params
        .s
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or(ParseError::MissingField("s"))?;
    let kind_value = params.e.as_deref().ok_or(ParseError::MissingField("e"))?;
    let kind = EventKind::parse(kind_value)
        .ok_or_else(|| ParseError::UnknownEventKind(kind_value.to_string()))?;

    let mut event = TrackedEvent::new(kind);
    event.field_name = params.n.clone();
    // a duration that does not parse is treated as absent, not as an error
    event.duration_ms = params.d.as_deref().and_then(|v| v.parse().ok());

    Ok(EventBatch {
        project_id,
        session_id,
        events: vec![event],
        sent_at: None,
    })
}

pub fn encode(batch: &EventBatch) -> Vec<Payload> {
    batch
        .events
        .iter()
        .map(|event| {
            let mut query = vec![
                ("i", batch.project_id.clone()),
                ("s", batch.session_id.clone()),
                ("e", event.kind.as_str().to_string()),
            ];
            if let Some(field_name) = &event.field_name {
                query.push(("n", field_name.clone()));
            }
            if let Some(duration) = event.duration_ms {
                query.push(("d", duration.to_string()));
            }
            Payload::Get { query }
        })
        .collect()
}
