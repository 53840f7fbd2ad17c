//! Response shapes and request decoding helpers.

use std::str::FromStr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use medrx_auth::Role;
use medrx_core::{DomainError, DomainResult};
use medrx_people::Person;
use medrx_prescriptions::Medication;
use medrx_infra::services::PrescriptionDetails;

use crate::app::errors;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredResponse<'a> {
    pub message: &'a str,
    pub person: &'a Person,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionResponse<'a> {
    pub message: &'a str,
    pub prescription: &'a PrescriptionDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationResponse<'a> {
    pub message: &'a str,
    pub medication: &'a Medication,
}

pub fn json<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}

pub fn message(status: StatusCode, message: impl Into<String>) -> Response {
    json(status, MessageResponse { message: message.into() })
}

/// Turn a service result into a response.
pub fn respond<T: Serialize>(status: StatusCode, result: DomainResult<T>) -> Response {
    match result {
        Ok(body) => json(status, body),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// Unwrap a JSON body, answering malformed input with a 400 in the usual shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "malformed request body");
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
    })
}

/// Parse a numeric path id.
pub fn parse_id<I>(raw: &str) -> Result<I, Response>
where
    I: FromStr<Err = DomainError>,
{
    raw.parse::<I>().map_err(errors::domain_error_to_response)
}
