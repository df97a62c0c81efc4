//! The delivery protocol between the collector agent and the ingestion
//! endpoint. Each wire shape is one variant of [`WireFormat`]; the server
//! side funnels every POST body through [`parse_batch`] and the client side
//! through [`encode_batch`], so the two directions cannot drift apart.

pub mod json;
pub mod pixel;
pub mod wrapped;

use thiserror::Error;

use crate::models::EventBatch;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("body is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),
}

/// The wire shapes a batch can travel as. Intermediary filters block
/// analytics traffic by URL and payload heuristics, so the shape is a
/// pluggable surface rather than a single hardcoded encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// `{pid, sid, events:[{evt,fld,dur,t}], ts}` as `application/json`.
    Json,
    /// `{p, s, d:[{e,n,x,ts,url}], t}` as `application/json`.
    CompactJson,
    /// base64(JSON) as `text/plain`, which keeps the request preflight-free.
    WrappedJson,
    /// One GET per event against the 1x1 pixel endpoint.
    Pixel,
}

/// A single client-side delivery. Pixel batches expand to one GET per event;
/// every other format is one POST per batch.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Post {
        content_type: &'static str,
        body: Vec<u8>,
    },
    Get {
        query: Vec<(&'static str, String)>,
    },
}

/// Decodes a POST body into a batch based on the declared content type.
/// `text/plain` and untyped bodies are treated as base64-wrapped JSON.
pub fn parse_batch(content_type: Option<&str>, body: &[u8]) -> Result<EventBatch, ParseError> {
    let mime = content_type
        .map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
        .unwrap_or_default();

    match mime.as_str() {
        "application/json" => json::parse(body),
        "" | "text/plain" => wrapped::parse(body),
        other => Err(ParseError::UnsupportedContentType(other.to_string())),
    }
}

/// Serializes a batch for delivery in the given wire shape.
pub fn encode_batch(
    format: WireFormat,
    batch: &EventBatch,
) -> Result<Vec<Payload>, serde_json::Error> {
    let payloads = match format {
        WireFormat::Json => vec![Payload::Post {
            content_type: "application/json",
            body: json::encode_full(batch)?,
        }],
        WireFormat::CompactJson => vec![Payload::Post {
            content_type: "application/json",
            body: json::encode_compact(batch)?,
        }],
        WireFormat::WrappedJson => vec![Payload::Post {
            content_type: "text/plain",
            body: wrapped::encode(batch)?,
        }],
        WireFormat::Pixel => pixel::encode(batch),
    };

    Ok(payloads)
}
