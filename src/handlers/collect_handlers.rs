use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{debug, error};

use crate::{
    error::AppError,
    models::{normalize_batch, EventBatch, RequestMeta},
    protocol::{self, pixel::PixelParams},
    state::AppState,
};

/// 1x1 transparent GIF89a returned by the pixel route.
const TRANSPARENT_GIF: [u8; 43] = [
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Strict collect route: parse and validation failures answer 400, valid
/// batches answer 204 before the store write is observed.
pub async fn collect_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let batch = parse_request(&headers, &body)?;

    if batch.project_id.is_empty() || batch.session_id.is_empty() {
        return Err(AppError::MissingIdentity);
    }

    dispatch_insert(&state, batch, request_meta(&headers));
    Ok(no_store(StatusCode::NO_CONTENT))
}

/// Permissive collect route: every request is answered 200, whether or not a
/// batch could be decoded from it. Failure is never signaled to the caller.
pub async fn collect_events_quiet(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match parse_request(&headers, &body) {
        Ok(batch) if !batch.project_id.is_empty() && !batch.session_id.is_empty() => {
            dispatch_insert(&state, batch, request_meta(&headers));
        }
        Ok(_) => debug!("dropping batch without project or session id"),
        Err(e) => debug!("dropping undecodable batch: {e}"),
    }

    no_store(StatusCode::OK)
}

/// Pixel route: always answers with the transparent GIF. Incomplete query
/// parameters degrade to a no-op.
pub async fn collect_pixel(
    State(state): State<AppState>,
    Query(params): Query<PixelParams>,
    headers: HeaderMap,
) -> Response {
    match protocol::pixel::parse(&params) {
        Ok(batch) => dispatch_insert(&state, batch, request_meta(&headers)),
        Err(e) => debug!("dropping pixel hit: {e}"),
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/gif"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        TRANSPARENT_GIF.to_vec(),
    )
        .into_response()
}

fn parse_request(headers: &HeaderMap, body: &Bytes) -> Result<EventBatch, AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    Ok(protocol::parse_batch(content_type, body)?)
}

/// Hands the batch to the store on a detached task. The response goes out
/// without waiting on the write; a failed write is logged and nothing else.
fn dispatch_insert(state: &AppState, batch: EventBatch, meta: RequestMeta) {
    let records = normalize_batch(&batch, &meta, Utc::now());
    if records.is_empty() {
        return;
    }

    let store = state.store.clone();
    tokio::spawn(async move {
        let count = records.len();
        if let Err(e) = store.append(records).await {
            error!("failed to append {count} event records: {e:?}");
        }
    });
}

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    // First hop of X-Forwarded-For, then X-Real-IP.
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        });

    RequestMeta {
        user_agent,
        ip_address,
    }
}

fn no_store(status: StatusCode) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );

        let meta = request_meta(&headers);
        assert_eq!(meta.ip_address, Some("203.0.113.9".to_string()));
    }

    #[test]
    fn real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));

        let meta = request_meta(&headers);
        assert_eq!(meta.ip_address, Some("198.51.100.7".to_string()));
    }

    #[test]
    fn pixel_bytes_are_a_gif() {
        assert_eq!(&TRANSPARENT_GIF[..6], b"GIF89a");
        assert_eq!(TRANSPARENT_GIF[42], 0x3b);
    }
}
