//! Self-service registration and login.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Response,
    routing::post,
};
use chrono::Utc;

use medrx_infra::services::{LoginRequest, registration_message};
use medrx_people::RegistrationRequest;

use crate::app::dto::{self, LoginResponse, RegisteredResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// POST /auth/register
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let request = match dto::body(payload) {
        Ok(r) => r,
        Err(res) => return res,
    };
    tracing::info!(username = ?request.username, "registering user");

    match services.accounts.register(&request, Utc::now().date_naive()) {
        Ok(person) => dto::json(
            StatusCode::CREATED,
            RegisteredResponse {
                message: registration_message(&person),
                person: &person,
            },
        ),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// POST /auth/login
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match dto::body(payload) {
        Ok(r) => r,
        Err(res) => return res,
    };

    let person = match services.accounts.login(&request) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let role = person.role();
    match services.tokens.issue(&person.username, role, Utc::now()) {
        Ok(token) => dto::json(
            StatusCode::OK,
            LoginResponse {
                token,
                username: person.username,
                role,
            },
        ),
        Err(e) => errors::domain_error_to_response(medrx_core::DomainError::internal(e.to_string())),
    }
}
