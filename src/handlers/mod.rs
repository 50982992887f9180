pub mod auth;
pub mod bookings;
pub mod health;
pub mod taxis;
pub mod tours;

use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// The full API surface. Built here (not in `main`) so integration tests can
/// drive the exact same router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/taxi", get(taxis::list).post(taxis::create))
        .route("/api/taxi/category/:category", get(taxis::list_by_category))
        .route("/api/taxi/admin/mine", get(taxis::list_mine))
        .route("/api/taxi/calculate-fare", post(taxis::calculate_fare))
        .route(
            "/api/taxi/:id",
            get(taxis::get_by_id)
                .put(taxis::update)
                .delete(taxis::soft_delete),
        )
        .route("/api/taxi/:id/toggle-status", patch(taxis::toggle_status))
        .route("/api/tours", get(tours::list).post(tours::create))
        .route("/api/tours/category/:category", get(tours::list_by_category))
        .route("/api/tours/admin/mine", get(tours::list_mine))
        .route(
            "/api/tours/:id",
            get(tours::get_by_id)
                .put(tours::update)
                .delete(tours::soft_delete),
        )
        .route("/api/tours/:id/toggle-status", patch(tours::toggle_status))
        .route("/api/bookings", post(bookings::create).get(bookings::list))
        .route("/api/bookings/customer/:phone", get(bookings::list_for_customer))
        .route(
            "/api/bookings/service/:service_type",
            get(bookings::list_for_service_type),
        )
        .route(
            "/api/bookings/admin/service-bookings",
            get(bookings::list_for_service_admin),
        )
        .route("/api/bookings/stats/overview", get(bookings::stats))
        .route(
            "/api/bookings/:id",
            get(bookings::get_by_id)
                .patch(bookings::update)
                .delete(bookings::cancel),
        )
        .with_state(state)
}

/// `{success: true, data, message}` — the envelope every success response uses.
pub(crate) fn success(data: impl Serialize, message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "data": data,
        "message": message,
    }))
}
