//! HTTP API for tee-cloud

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod tee_sheet;

#[cfg(test)]
mod tests;

use axum::extract::rejection::JsonRejection;
use axum::routing::{delete, get, post};
use axum::{Json, Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

use crate::auth::identity::{admin_auth_middleware, member_auth_middleware};
use crate::auth::rate_limit::{admin_login_rate_limit, login_rate_limit, register_rate_limit};
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Unwrap a JSON request body; rejections are reported in the error envelope.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(req)| req).map_err(|e| {
        AppError::validation("Invalid request body").with_detail("reason", e.body_text())
    })
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Credential endpoints (rate-limited per IP)
    let register = Router::new()
        .route("/api/register", post(auth::register))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));
    let login = Router::new()
        .route("/api/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));
    let admin_login = Router::new()
        .route("/api/admin/login", post(auth::admin_login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_login_rate_limit,
        ));

    // Member endpoints (member token)
    let member = Router::new()
        .route("/api/slots/{id}/book", post(bookings::book))
        .route("/api/bookings", get(bookings::list))
        .route("/api/bookings/{id}/cancel", post(bookings::cancel))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            member_auth_middleware,
        ));

    // Schedule management (admin token)
    let admin = Router::new()
        .route("/api/admin/slots", post(admin::create_slot))
        .route("/api/admin/slots/{id}", delete(admin::delete_slot))
        .route("/api/admin/days/generate", post(admin::generate_day))
        .route("/api/admin/days/reset", post(admin::reset_day))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/tee-sheet", get(tee_sheet::tee_sheet))
        .route("/api/slots/{id}", get(tee_sheet::slot_detail))
        .merge(register)
        .merge(login)
        .merge(admin_login)
        .merge(member)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
