use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::collect_handlers::{collect_events, collect_events_quiet, collect_pixel};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = create_cors_layer();

    Router::new()
        .route("/collect", post(collect_events))
        .route("/c", post(collect_events_quiet))
        .route("/p.gif", get(collect_pixel))
        .with_state(state)
        .layer(cors)
}

/// Any embedding site may deliver, so the allowed origin mirrors whatever the
/// request declares. The layer also answers OPTIONS preflights.
fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}
