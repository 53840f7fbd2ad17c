//! Pharmacist routes: the pharmacy's queue and fulfillment.

use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::Path,
    http::StatusCode,
    response::Response,
    routing::{get, put},
};

use medrx_core::{PersonId, PrescriptionId};

use crate::app::dto::{self, PrescriptionResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:pharmacist_id/prescriptions", get(list_queue))
        .route("/:pharmacist_id/prescriptions/:prescription_id", put(fulfill))
}

fn acting_pharmacist(
    services: &AppServices,
    principal: &PrincipalContext,
    raw: &str,
) -> Result<PersonId, Response> {
    let id: PersonId = dto::parse_id(raw)?;
    services
        .actors
        .ensure_acting_as(id, principal.principal())
        .map_err(errors::domain_error_to_response)?;
    Ok(id)
}

/// GET /pharmacists/:pharmacist_id/prescriptions
pub async fn list_queue(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(pharmacist_id): Path<String>,
) -> Response {
    let pharmacist_id = match acting_pharmacist(&services, &principal, &pharmacist_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    dto::respond(StatusCode::OK, services.workflow.pharmacy_prescriptions(pharmacist_id))
}

/// PUT /pharmacists/:pharmacist_id/prescriptions/:prescription_id
pub async fn fulfill(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((pharmacist_id, prescription_id)): Path<(String, String)>,
) -> Response {
    let pharmacist_id = match acting_pharmacist(&services, &principal, &pharmacist_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let prescription_id: PrescriptionId = match dto::parse_id(&prescription_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    tracing::info!(%pharmacist_id, %prescription_id, "fulfilling prescription");
    match services.workflow.fulfill(pharmacist_id, prescription_id) {
        Ok(prescription) => dto::json(
            StatusCode::OK,
            PrescriptionResponse {
                message: "Prescription fulfilled.",
                prescription: &prescription,
            },
        ),
        Err(e) => errors::domain_error_to_response(e),
    }
}
