use axum::{
    Router,
    http::{HeaderName, Method},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    interface::http::gantt_handler::{healthcheck, load, resolve_preset, sync},
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .route("/health", get(healthcheck))
        .route("/api/v1/gantt/load", get(load))
        .route("/api/v1/gantt/sync", post(sync))
        .route("/api/v1/onboarding/preset", post(resolve_preset))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .with_state(state)
}
