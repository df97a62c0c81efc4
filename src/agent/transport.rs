use reqwest::header::CONTENT_TYPE;
use tracing::trace;

use crate::protocol::Payload;

/// Fire-and-forget delivery. Implementations must never surface an error to
/// the caller and must never retry; an undelivered batch is acceptable loss.
pub trait Transport: Send + Sync {
    fn deliver(&self, endpoint: &str, payload: Payload);
}

/// Reqwest-backed transport. The request is issued on a detached task and
/// the response is never read, so delivery keeps going past the point where
/// the caller has moved on.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn deliver(&self, endpoint: &str, payload: Payload) {
        let request = match payload {
            Payload::Post { content_type, body } => self
                .client
                .post(endpoint)
                .header(CONTENT_TYPE, content_type)
                .body(body),
            Payload::Get { query } => self.client.get(endpoint).query(&query),
        };

        tokio::spawn(async move {
            if let Err(e) = request.send().await {
                trace!("delivery dropped: {e}");
            }
        });
    }
}
