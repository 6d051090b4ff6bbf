pub mod auth;
pub mod buses;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::ServerState;

/// Headroom above the image limit for the text parts of a multipart body.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "meta", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (StatusCode, String) {
    common::metrics::encode_metrics()
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public reads, protected writes, static uploads.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let body_limit = state.uploads.max_file_bytes() as usize + FORM_OVERHEAD_BYTES;
    let uploads_dir = ServeDir::new(state.uploads.dir());

    // Public routes
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/login", post(auth::login))
        .route("/buses", get(buses::list))
        .route("/buses/:id", get(buses::get))
        .nest_service(state.uploads.public_path(), uploads_dir);

    // Protected routes
    let protected = Router::new()
        .route("/admins", post(auth::create_admin))
        .route("/buses", post(buses::create))
        .route("/buses/:id", put(buses::update).delete(buses::delete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    // Compose
    public
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
