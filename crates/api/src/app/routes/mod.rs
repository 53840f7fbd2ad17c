use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod doctors;
pub mod medicines;
pub mod patients;
pub mod pharmacists;
pub mod prescriptions;
pub mod system;

/// Router for every endpoint behind the access guard.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
        .nest("/prescriptions", prescriptions::router())
        .nest("/doctors", doctors::router())
        .nest("/pharmacists", pharmacists::router())
        .nest("/patients", patients::router())
        .nest("/medicines", medicines::router())
}
