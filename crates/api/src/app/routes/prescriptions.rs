//! Admin-tier prescription reads.

use std::sync::Arc;

use axum::{Extension, Router, extract::Path, http::StatusCode, response::Response, routing::get};

use medrx_core::PrescriptionId;

use crate::app::dto;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_all))
        .route("/:id", get(get_one))
}

/// GET /prescriptions
pub async fn list_all(Extension(services): Extension<Arc<AppServices>>) -> Response {
    dto::respond(StatusCode::OK, services.workflow.all_prescriptions())
}

/// GET /prescriptions/:id
pub async fn get_one(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    let id: PrescriptionId = match dto::parse_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    dto::respond(StatusCode::OK, services.workflow.prescription(id))
}
