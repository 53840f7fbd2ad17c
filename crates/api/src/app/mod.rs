//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: directory and token issuer wiring
//! - `routes/`: HTTP routes + handlers, one file per area
//! - `dto.rs`: response shapes and request decoding helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, extract::Request, routing::get};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use medrx_auth::JwtValidator;
use medrx_infra::EntityDirectory;

use crate::config::ApiConfig;
use crate::middleware::{self, REQUEST_ID_HEADER};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router over `directory`.
pub fn build_app(config: &ApiConfig, directory: Arc<dyn EntityDirectory>) -> Router {
    let services = Arc::new(services::AppServices::new(Arc::clone(&directory), config));
    let jwt: Arc<dyn JwtValidator> = services.tokens.clone();
    let auth_state = middleware::AuthState { jwt, directory };

    // Guarded routes: the access guard runs after the token is decoded.
    let guarded = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::access_guard))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(guarded)
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(errors::panic_response))
                .layer(axum::middleware::from_fn(middleware::request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                    let request_id = req
                        .headers()
                        .get(&REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http",
                        method = %req.method(),
                        path = %req.uri().path(),
                        request_id = %request_id,
                    )
                })),
        )
}
