//! Base64-wrapped JSON sent as `text/plain`. A plain-text body keeps the
//! browser from issuing a CORS preflight, so delivery is a single request.

use base64::{engine::general_purpose, Engine};

use super::{json, ParseError};
use crate::models::EventBatch;

pub fn parse(body: &[u8]) -> Result<EventBatch, ParseError> {
    let text = std::str::from_utf8(body)?;
    let decoded = general_purpose::STANDARD.decode(text.trim())?;
    json::parse(&decoded)
}

pub fn encode(batch: &EventBatch) -> Result<Vec<u8>, serde_json::Error> {
    let inner = json::encode_full(batch)?;
    Ok(general_purpose::STANDARD.encode(inner).into_bytes())
}
