//! Admin tier: admin registration, account approval, admin deletion.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{delete, post, put},
};

use medrx_core::PersonId;
use medrx_people::RegistrationRequest;

use crate::app::dto::{self, RegisteredResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register_admin))
        .route("/approve/:username", put(approve))
        .route("/:id", delete(delete_admin))
}

/// POST /admin/register
///
/// Open while no admin exists; afterwards SUPER_ADMIN only.
pub async fn register_admin(
    Extension(services): Extension<Arc<AppServices>>,
    principal: Option<Extension<PrincipalContext>>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Response {
    let request = match dto::body(payload) {
        Ok(r) => r,
        Err(res) => return res,
    };
    let actor = principal.as_ref().map(|Extension(p)| p.principal());

    match services.admin.register_admin(actor, &request) {
        Ok(admin) => dto::json(
            StatusCode::CREATED,
            RegisteredResponse {
                message: "New admin succesfully registered.",
                person: &admin,
            },
        ),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PUT /admin/approve/:username
pub async fn approve(
    Extension(services): Extension<Arc<AppServices>>,
    Path(username): Path<String>,
) -> Response {
    tracing::info!(%username, "approving user");
    match services.admin.approve(&username) {
        Ok((_, outcome)) => dto::message(StatusCode::OK, outcome.message()),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// DELETE /admin/:id
pub async fn delete_admin(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let id: PersonId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.admin.delete_admin(ctx.principal(), id) {
        Ok(_) => dto::message(StatusCode::OK, format!("Admin with ID {id} deleted.")),
        Err(e) => errors::domain_error_to_response(e),
    }
}
