//! Medication catalog routes.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::get,
};

use medrx_core::MedicationId;
use medrx_prescriptions::MedicationRequest;

use crate::app::dto::{self, MedicationResponse};
use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(get_one).put(update).delete(remove))
}

/// GET /medicines
pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> Response {
    dto::respond(StatusCode::OK, services.catalog.list())
}

/// GET /medicines/:id
pub async fn get_one(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: MedicationId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    dto::respond(StatusCode::OK, services.catalog.get(id))
}

/// POST /medicines
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<MedicationRequest>, JsonRejection>,
) -> Response {
    let request = match dto::body(payload) {
        Ok(r) => r,
        Err(res) => return res,
    };
    match services.catalog.create(&request) {
        Ok(medication) => dto::json(
            StatusCode::CREATED,
            MedicationResponse {
                message: "Medication created.",
                medication: &medication,
            },
        ),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PUT /medicines/:id
pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<MedicationRequest>, JsonRejection>,
) -> Response {
    let id: MedicationId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let request = match dto::body(payload) {
        Ok(r) => r,
        Err(res) => return res,
    };
    dto::respond(StatusCode::OK, services.catalog.update(id, &request))
}

/// DELETE /medicines/:id
pub async fn remove(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: MedicationId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.catalog.delete(id) {
        Ok(removed) => dto::message(
            StatusCode::OK,
            format!("Medication '{}' deleted.", removed.name),
        ),
        Err(e) => errors::domain_error_to_response(e),
    }
}
