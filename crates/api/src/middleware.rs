use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use medrx_auth::{
    Access, AuthzError, JwtClaims, JwtValidator, Principal, authorize, explain_authorization,
    role_for,
};
use medrx_infra::EntityDirectory;
use medrx_infra::directory::DirectoryError;

use crate::app::errors::{domain_error_to_response, json_error};
use crate::context::{AuthFailure, PrincipalContext, RequestId};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub directory: Arc<dyn EntityDirectory>,
}

/// Why verified claims could not be bound to an account.
#[derive(Debug)]
enum AccountCheck {
    Refused(&'static str),
    Failed(DirectoryError),
}

/// Decode an optional bearer token into a [`PrincipalContext`].
///
/// Requests without a token pass through anonymously; a token that cannot be
/// accepted is recorded as an [`AuthFailure`] for the access guard to judge.
pub async fn auth_middleware(State(state): State<AuthState>, mut req: Request, next: Next) -> Response {
    let outcome = match extract_bearer(req.headers()) {
        Ok(None) => None,
        Ok(Some(token)) => match state.jwt.validate(token, Utc::now()) {
            Ok(claims) => match bind_to_account(state.directory.as_ref(), &claims) {
                Ok(principal) => Some(Ok(principal)),
                Err(AccountCheck::Refused(reason)) => Some(Err(reason.to_string())),
                Err(AccountCheck::Failed(e)) => return domain_error_to_response(e.into()),
            },
            Err(e) => Some(Err(e.to_string())),
        },
        Err(reason) => Some(Err(reason.to_string())),
    };

    match outcome {
        Some(Ok(principal)) => {
            req.extensions_mut().insert(PrincipalContext::new(principal));
        }
        Some(Err(reason)) => {
            tracing::debug!(%reason, "bearer token rejected");
            req.extensions_mut().insert(AuthFailure { reason });
        }
        None => {}
    }

    next.run(req).await
}

/// Enforce the route table for every request behind it.
pub async fn access_guard(req: Request, next: Next) -> Response {
    let access = role_for(req.uri().path(), req.method().as_str());
    if access == Access::Public {
        return next.run(req).await;
    }

    if let Some(failure) = req.extensions().get::<AuthFailure>() {
        tracing::warn!(path = %req.uri().path(), reason = %failure.reason, "invalid bearer token");
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "invalid or expired token");
    }

    let principal = req.extensions().get::<PrincipalContext>().map(|c| c.principal());
    let explanation = explain_authorization(access, principal);
    tracing::debug!(
        path = %req.uri().path(),
        method = %req.method(),
        required = %explanation.required,
        granted = explanation.granted,
        reason = %explanation.reason,
        username = ?explanation.username,
        roles = ?explanation.roles,
        "access decision"
    );

    match authorize(access, principal) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), error = %e, "access denied");
            let message = match e {
                AuthzError::Unauthenticated => "authentication required".to_string(),
                other => other.to_string(),
            };
            json_error(StatusCode::FORBIDDEN, "forbidden", message)
        }
    }
}

/// Reuse the caller's `x-request-id` or mint a v7 UUID, and echo it back.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let Ok(value) = HeaderValue::from_str(&id) else {
        return next.run(req).await;
    };
    req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    req.extensions_mut().insert(RequestId(id));

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, value);
    res
}

/// Resolve the token subject against the directory.
///
/// The account must still exist and be approved. Its stored role replaces the
/// known roles claimed by the token; unrecognized role claims are kept so the
/// guard still denies them.
fn bind_to_account(directory: &dyn EntityDirectory, claims: &JwtClaims) -> Result<Principal, AccountCheck> {
    let person = directory
        .find_person_by_username(&claims.sub)
        .map_err(AccountCheck::Failed)?
        .ok_or(AccountCheck::Refused("account no longer exists"))?;
    if !person.can_authenticate() {
        return Err(AccountCheck::Refused("account is not approved"));
    }

    let mut principal = Principal::from_claims(claims);
    principal.roles = vec![person.role()];
    Ok(principal)
}

/// `Ok(None)` when no Authorization header is present.
fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, &'static str> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| "authorization header is not ASCII")?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header is not a bearer token")?
        .trim();
    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(Some(token))
}
