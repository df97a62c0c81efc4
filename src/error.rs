use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::protocol::ParseError;

/// Errors the strict collect route reports to the caller. The permissive
/// routes never construct one of these; they degrade to soft success instead.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] ParseError),

    #[error("missing project or session id")]
    MissingIdentity,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}
