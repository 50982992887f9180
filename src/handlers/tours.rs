use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::success;
use crate::models::{Role, Tour, User};
use crate::state::AppState;

const DEFAULT_IMAGE: &str = "/images/default-tour.jpg";

fn ensure_owner(user: &User, tour: &Tour, action: &str) -> Result<(), AppError> {
    if tour.created_by != user.id && user.role != Role::Superadmin {
        return Err(AppError::Forbidden(format!(
            "not authorized to {action} this tour package"
        )));
    }
    Ok(())
}

// GET /api/tours
pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let tours = queries::list_active_tours(&db)?;
    Ok(success(tours, "Tour packages retrieved successfully"))
}

// GET /api/tours/category/:category
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let tours = queries::list_active_tours_by_category(&db, &category.to_lowercase())?;
    Ok(success(
        tours,
        &format!("Tour packages for {category} category"),
    ))
}

// GET /api/tours/admin/mine — caller's own records, inactive included
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;
    let tours = queries::list_tours_by_owner(&db, &admin.id)?;
    Ok(success(tours, "Admin tours retrieved successfully"))
}

// GET /api/tours/:id — public detail, so inactive records 404 here
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let tour = queries::get_tour_by_id(&db, &id)?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::NotFound("Tour not found".to_string()))?;
    Ok(success(tour, "Tour details retrieved successfully"))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TourPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub tour_type: Option<String>,
    pub duration: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub features: Option<Vec<String>>,
    pub inclusions: Option<Vec<String>>,
    pub places: Option<Vec<String>>,
    pub image: Option<String>,
    pub max_capacity: Option<i64>,
    pub min_capacity: Option<i64>,
}

// POST /api/tours
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TourPayload>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let mut missing = vec![];
    if body.name.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("name".to_string());
    }
    if body.description.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("description".to_string());
    }
    if body.tour_type.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("type".to_string());
    }
    if body.duration.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("duration".to_string());
    }
    if body.category.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("category".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let now = Utc::now().naive_utc();
    let tour = Tour {
        id: Uuid::new_v4().to_string(),
        name: body.name.unwrap_or_default().trim().to_string(),
        description: body.description.unwrap_or_default().trim().to_string(),
        tour_type: body.tour_type.unwrap_or_default().trim().to_string(),
        duration: body.duration.unwrap_or_default().trim().to_string(),
        price: body
            .price
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "On Request".to_string()),
        category: body.category.unwrap_or_default().trim().to_lowercase(),
        features: body.features.unwrap_or_default(),
        inclusions: body.inclusions.unwrap_or_default(),
        places: body.places.unwrap_or_default(),
        image: body.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        max_capacity: body.max_capacity.unwrap_or(50),
        min_capacity: body.min_capacity.unwrap_or(1),
        is_active: true,
        created_by: admin.id,
        created_at: now,
        updated_at: now,
    };
    queries::create_tour(&db, &tour)?;

    Ok((
        StatusCode::CREATED,
        success(tour, "Tour package created successfully"),
    ))
}

// PUT /api/tours/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TourPayload>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let mut tour = queries::get_tour_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Tour package not found".to_string()))?;
    ensure_owner(&admin, &tour, "update")?;

    if let Some(name) = body.name {
        tour.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        tour.description = description.trim().to_string();
    }
    if let Some(tour_type) = body.tour_type {
        tour.tour_type = tour_type.trim().to_string();
    }
    if let Some(duration) = body.duration {
        tour.duration = duration.trim().to_string();
    }
    if let Some(price) = body.price {
        tour.price = price.trim().to_string();
    }
    if let Some(category) = body.category {
        tour.category = category.trim().to_lowercase();
    }
    if let Some(features) = body.features {
        tour.features = features;
    }
    if let Some(inclusions) = body.inclusions {
        tour.inclusions = inclusions;
    }
    if let Some(places) = body.places {
        tour.places = places;
    }
    if let Some(image) = body.image {
        tour.image = image;
    }
    if let Some(max_capacity) = body.max_capacity {
        tour.max_capacity = max_capacity;
    }
    if let Some(min_capacity) = body.min_capacity {
        tour.min_capacity = min_capacity;
    }
    tour.updated_at = Utc::now().naive_utc();

    queries::update_tour(&db, &tour)?;
    Ok(success(tour, "Tour package updated successfully"))
}

// DELETE /api/tours/:id — soft delete
pub async fn soft_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let tour = queries::get_tour_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Tour package not found".to_string()))?;
    ensure_owner(&admin, &tour, "delete")?;

    queries::set_tour_active(&db, &id, false)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Tour package deleted successfully",
    })))
}

// PATCH /api/tours/:id/toggle-status
pub async fn toggle_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let mut tour = queries::get_tour_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Tour package not found".to_string()))?;
    ensure_owner(&admin, &tour, "modify")?;

    tour.is_active = !tour.is_active;
    queries::set_tour_active(&db, &id, tour.is_active)?;

    let message = if tour.is_active {
        "Tour package activated successfully"
    } else {
        "Tour package deactivated successfully"
    };
    Ok(success(tour, message))
}
