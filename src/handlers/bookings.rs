use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::success;
use crate::models::{BookingStatus, ServiceType};
use crate::services::booking::{self, BookingRequest};
use crate::state::AppState;

// POST /api/bookings — open to anonymous callers; a valid token just tags
// the booking with who created it.
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let caller = auth::optional_caller(&db, &headers, &state.config.jwt_secret);

    let created = booking::create_booking(&db, body, caller.as_ref())?;
    tracing::info!(booking_number = %created.booking_number, "booking created");

    Ok((
        StatusCode::CREATED,
        success(created, "Booking created successfully"),
    ))
}

// GET /api/bookings
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let bookings = queries::list_bookings(&db)?;
    Ok(success(bookings, "Bookings retrieved successfully"))
}

// GET /api/bookings/:id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
    Ok(success(booking, "Booking retrieved successfully"))
}

// GET /api/bookings/customer/:phone — the customer's own view, keyed by the
// phone number used at creation.
pub async fn list_for_customer(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let bookings = queries::list_bookings_by_phone(&db, &phone)?;
    Ok(success(bookings, "Customer bookings retrieved successfully"))
}

// GET /api/bookings/service/:service_type
pub async fn list_for_service_type(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(service_type): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let service_type = ServiceType::parse(&service_type).ok_or_else(|| {
        AppError::Validation("serviceType must be 'taxi' or 'tour'".to_string())
    })?;
    let bookings = queries::list_bookings_by_service_type(&db, service_type)?;
    Ok(success(bookings, "Bookings retrieved successfully"))
}

// GET /api/bookings/admin/service-bookings — bookings placed against the
// caller's own catalog records.
pub async fn list_for_service_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let bookings = queries::list_bookings_by_service_admin(&db, &admin.id)?;
    Ok(success(bookings, "Service bookings retrieved successfully"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBookingRequest {
    pub status: Option<String>,
    pub total_amount: Option<f64>,
    pub special_requests: Option<String>,
}

// PATCH /api/bookings/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let mut booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if let Some(status_raw) = body.status {
        let next = BookingStatus::parse(&status_raw)
            .ok_or_else(|| AppError::Validation("invalid status value".to_string()))?;
        // Same-status updates are a no-op; anything else must follow the
        // transition graph.
        if next != booking.status && !booking.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "cannot change booking status from {} to {}",
                booking.status.as_str(),
                next.as_str()
            )));
        }
        booking.status = next;
    }
    if let Some(total_amount) = body.total_amount {
        booking.total_amount = total_amount;
    }
    if let Some(special_requests) = body.special_requests {
        booking.special_requests = special_requests;
    }
    booking.updated_at = Utc::now().naive_utc();

    queries::update_booking(&db, &booking)?;
    Ok(success(booking, "Booking updated successfully"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelParams {
    pub phone: Option<String>,
}

// DELETE /api/bookings/:id?phone=… — cancellation, not deletion. The phone
// must match the one on the booking; a miss is indistinguishable from a
// missing booking.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<CancelParams>,
) -> Result<impl IntoResponse, AppError> {
    let phone = params
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("Phone is required to cancel booking".to_string()))?;

    let db = state.db.lock().unwrap();
    if !queries::cancel_booking_for_phone(&db, &id, &phone)? {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }

    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
    Ok(success(booking, "Booking cancelled successfully"))
}

// GET /api/bookings/stats/overview
pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let stats = queries::get_booking_stats(&db)?;
    let average = if stats.completed > 0 {
        (stats.total_revenue / stats.completed as f64).round()
    } else {
        0.0
    };

    Ok(success(
        serde_json::json!({
            "totalBookings": stats.total,
            "pendingBookings": stats.pending,
            "confirmedBookings": stats.confirmed,
            "completedBookings": stats.completed,
            "cancelledBookings": stats.cancelled,
            "taxiBookings": stats.taxi,
            "tourBookings": stats.tour,
            "totalRevenue": format!("₹{}", stats.total_revenue),
            "averageRevenue": format!("₹{}", average),
        }),
        "Booking statistics retrieved successfully",
    ))
}
