//! Doctor routes: issue, cancel and read own prescriptions.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::get,
};

use medrx_core::{PersonId, PrescriptionId};
use medrx_infra::services::TransitionOutcome;
use medrx_prescriptions::PrescriptionDraft;

use crate::app::dto::{self, PrescriptionResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    // The trailing segment is a prescription id for GET/PUT and a patient id for POST.
    Router::new()
        .route("/:doctor_id/prescriptions", get(list_own))
        .route(
            "/:doctor_id/prescriptions/:target_id",
            get(get_own).put(cancel).post(issue),
        )
}

/// Parse the doctor id and bind it to the caller.
fn acting_doctor(
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

/// GET /doctors/:doctor_id/prescriptions
pub async fn list_own(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(doctor_id): Path<String>,
) -> Response {
    let doctor_id = match acting_doctor(&services, &principal, &doctor_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    dto::respond(StatusCode::OK, services.workflow.doctor_prescriptions(doctor_id))
}

/// GET /doctors/:doctor_id/prescriptions/:prescription_id
pub async fn get_own(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((doctor_id, prescription_id)): Path<(String, String)>,
) -> Response {
    let doctor_id = match acting_doctor(&services, &principal, &doctor_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let prescription_id: PrescriptionId = match dto::parse_id(&prescription_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    dto::respond(
        StatusCode::OK,
        services.workflow.doctor_prescription(doctor_id, prescription_id),
    )
}

/// POST /doctors/:doctor_id/prescriptions/:patient_id
pub async fn issue(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((doctor_id, patient_id)): Path<(String, String)>,
    payload: Result<Json<PrescriptionDraft>, JsonRejection>,
) -> Response {
    let doctor_id = match acting_doctor(&services, &principal, &doctor_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let patient_id: PersonId = match dto::parse_id(&patient_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let draft = match dto::body(payload) {
        Ok(d) => d,
        Err(res) => return res,
    };

    match services.workflow.issue(doctor_id, patient_id, &draft) {
        Ok(prescription) => dto::json(
            StatusCode::CREATED,
            PrescriptionResponse {
                message: "Prescription created.",
                prescription: &prescription,
            },
        ),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// PUT /doctors/:doctor_id/prescriptions/:prescription_id
pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((doctor_id, prescription_id)): Path<(String, String)>,
) -> Response {
    let doctor_id = match acting_doctor(&services, &principal, &doctor_id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let prescription_id: PrescriptionId = match dto::parse_id(&prescription_id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.workflow.cancel(doctor_id, prescription_id) {
        Ok((prescription, outcome)) => {
            let message = match outcome {
                TransitionOutcome::Applied => "Prescription canceled.",
                TransitionOutcome::Unchanged => "Prescription is already canceled.",
            };
            dto::json(
                StatusCode::OK,
                PrescriptionResponse {
                    message,
                    prescription: &prescription,
                },
            )
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}
