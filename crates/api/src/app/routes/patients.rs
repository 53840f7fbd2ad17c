use std::sync::Arc;

use axum::{Extension, Router, extract::Path, http::StatusCode, response::Response, routing::get};

use medrx_core::PersonId;

use crate::app::dto;
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/:patient_id/prescriptions", get(list_own))
}

/// GET /patients/:patient_id/prescriptions
pub async fn list_own(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(patient_id): Path<String>,
) -> Response {
    let patient_id: PersonId = match dto::parse_id(&patient_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    if let Err(e) = services.actors.ensure_acting_as(patient_id, principal.principal()) {
        return errors::domain_error_to_response(e);
    }
    dto::respond(StatusCode::OK, services.workflow.patient_prescriptions(patient_id))
}
