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
use crate::models::{Role, Taxi, User};
use crate::services::fare;
use crate::state::AppState;

const DEFAULT_FEATURES: &[&str] = &["Driver", "Fuel", "Water", "Parking", "Toll-Tax"];
const DEFAULT_IMAGE: &str = "/images/default-taxi.jpg";

fn ensure_owner(user: &User, taxi: &Taxi, action: &str) -> Result<(), AppError> {
    if taxi.created_by != user.id && user.role != Role::Superadmin {
        return Err(AppError::Forbidden(format!(
            "not authorized to {action} this taxi service"
        )));
    }
    Ok(())
}

// GET /api/taxi
pub async fn list(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let taxis = queries::list_active_taxis(&db)?;
    Ok(success(taxis, "Taxi options retrieved successfully"))
}

// GET /api/taxi/category/:category
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let taxis = queries::list_active_taxis_by_category(&db, &category.to_lowercase())?;
    Ok(success(
        taxis,
        &format!("Taxi options for {category} category"),
    ))
}

// GET /api/taxi/admin/mine — caller's own records, inactive included
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;
    let taxis = queries::list_taxis_by_owner(&db, &admin.id)?;
    Ok(success(taxis, "Admin taxis retrieved successfully"))
}

// GET /api/taxi/:id — public detail, so inactive records 404 here
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let taxi = queries::get_taxi_by_id(&db, &id)?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::NotFound("Taxi not found".to_string()))?;
    Ok(success(taxi, "Taxi details retrieved successfully"))
}

/// Shared payload for create and update; create enforces the required
/// subset, update applies only the provided fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaxiPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub taxi_type: Option<String>,
    pub category: Option<String>,
    pub base_price: Option<f64>,
    pub price_per_km: Option<f64>,
    pub price_per_hour: Option<f64>,
    pub minimum_fare: Option<f64>,
    pub capacity: Option<i64>,
    pub features: Option<Vec<String>>,
    pub available_areas: Option<Vec<String>>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub ac: Option<bool>,
    pub driver_included: Option<bool>,
    pub image: Option<String>,
}

// POST /api/taxi
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TaxiPayload>,
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
    if body.taxi_type.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("type".to_string());
    }
    if body.category.as_deref().map_or(true, |s| s.trim().is_empty()) {
        missing.push("category".to_string());
    }
    if body.price_per_km.is_none() {
        missing.push("pricePerKm".to_string());
    }
    if body.capacity.is_none() {
        missing.push("capacity".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let now = Utc::now().naive_utc();
    let taxi = Taxi {
        id: Uuid::new_v4().to_string(),
        name: body.name.unwrap_or_default().trim().to_string(),
        description: body.description.unwrap_or_default().trim().to_string(),
        taxi_type: body.taxi_type.unwrap_or_default().trim().to_string(),
        category: body.category.unwrap_or_default().trim().to_lowercase(),
        base_price: body.base_price.unwrap_or(0.0),
        price_per_km: body.price_per_km.unwrap_or(0.0),
        price_per_hour: body.price_per_hour.unwrap_or(0.0),
        minimum_fare: body.minimum_fare.unwrap_or(0.0),
        capacity: body.capacity.unwrap_or(4),
        features: body
            .features
            .unwrap_or_else(|| DEFAULT_FEATURES.iter().map(|s| s.to_string()).collect()),
        available_areas: body.available_areas.unwrap_or_default(),
        fuel_type: body.fuel_type.unwrap_or_else(|| "Petrol".to_string()),
        transmission: body.transmission.unwrap_or_else(|| "Manual".to_string()),
        ac: body.ac.unwrap_or(true),
        driver_included: body.driver_included.unwrap_or(true),
        image: body.image.unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        is_active: true,
        created_by: admin.id,
        created_at: now,
        updated_at: now,
    };
    queries::create_taxi(&db, &taxi)?;

    Ok((
        StatusCode::CREATED,
        success(taxi, "Taxi service created successfully"),
    ))
}

// PUT /api/taxi/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TaxiPayload>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let mut taxi = queries::get_taxi_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Taxi service not found".to_string()))?;
    ensure_owner(&admin, &taxi, "update")?;

    if let Some(name) = body.name {
        taxi.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        taxi.description = description.trim().to_string();
    }
    if let Some(taxi_type) = body.taxi_type {
        taxi.taxi_type = taxi_type.trim().to_string();
    }
    if let Some(category) = body.category {
        taxi.category = category.trim().to_lowercase();
    }
    if let Some(base_price) = body.base_price {
        taxi.base_price = base_price;
    }
    if let Some(price_per_km) = body.price_per_km {
        taxi.price_per_km = price_per_km;
    }
    if let Some(price_per_hour) = body.price_per_hour {
        taxi.price_per_hour = price_per_hour;
    }
    if let Some(minimum_fare) = body.minimum_fare {
        taxi.minimum_fare = minimum_fare;
    }
    if let Some(capacity) = body.capacity {
        taxi.capacity = capacity;
    }
    if let Some(features) = body.features {
        taxi.features = features;
    }
    if let Some(areas) = body.available_areas {
        taxi.available_areas = areas;
    }
    if let Some(fuel_type) = body.fuel_type {
        taxi.fuel_type = fuel_type;
    }
    if let Some(transmission) = body.transmission {
        taxi.transmission = transmission;
    }
    if let Some(ac) = body.ac {
        taxi.ac = ac;
    }
    if let Some(driver_included) = body.driver_included {
        taxi.driver_included = driver_included;
    }
    if let Some(image) = body.image {
        taxi.image = image;
    }
    taxi.updated_at = Utc::now().naive_utc();

    queries::update_taxi(&db, &taxi)?;
    Ok(success(taxi, "Taxi service updated successfully"))
}

// DELETE /api/taxi/:id — soft delete
pub async fn soft_delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let taxi = queries::get_taxi_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Taxi service not found".to_string()))?;
    ensure_owner(&admin, &taxi, "delete")?;

    queries::set_taxi_active(&db, &id, false)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Taxi service deleted successfully",
    })))
}

// PATCH /api/taxi/:id/toggle-status
pub async fn toggle_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db.lock().unwrap();
    let admin = auth::require_admin(&db, &headers, &state.config.jwt_secret)?;

    let mut taxi = queries::get_taxi_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("Taxi service not found".to_string()))?;
    ensure_owner(&admin, &taxi, "modify")?;

    taxi.is_active = !taxi.is_active;
    queries::set_taxi_active(&db, &id, taxi.is_active)?;

    let message = if taxi.is_active {
        "Taxi service activated successfully"
    } else {
        "Taxi service deactivated successfully"
    };
    Ok(success(taxi, message))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FareRequest {
    pub taxi_id: Option<String>,
    pub distance: Option<f64>,
    pub hours: Option<f64>,
}

// POST /api/taxi/calculate-fare
pub async fn calculate_fare(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FareRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut missing = vec![];
    if body.taxi_id.as_deref().map_or(true, |s| s.is_empty()) {
        missing.push("taxiId".to_string());
    }
    if body.distance.is_none() {
        missing.push("distance".to_string());
    }
    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    let distance = body.distance.unwrap_or(0.0);
    let hours = body.hours.unwrap_or(0.0);
    if distance < 0.0 || hours < 0.0 {
        return Err(AppError::Validation(
            "distance and hours must be non-negative".to_string(),
        ));
    }

    let db = state.db.lock().unwrap();
    let taxi = queries::get_taxi_by_id(&db, body.taxi_id.as_deref().unwrap_or_default())?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::NotFound("Taxi not found".to_string()))?;

    let quote = fare::estimate(
        taxi.price_per_km,
        taxi.price_per_hour,
        taxi.minimum_fare,
        distance,
        hours,
    );

    Ok(success(
        serde_json::json!({
            "taxi": taxi.name,
            "distance": format!("{distance} km"),
            "hours": hours,
            "baseFare": format!("₹{}", quote.base_fare),
            "hourlyCharge": format!("₹{}", quote.hourly_charge),
            "minimumFare": format!("₹{}", quote.minimum_fare),
            "totalFare": format!("₹{}", quote.total_fare),
            "breakdown": {
                "perKm": format!("₹{}", taxi.price_per_km),
                "perHour": format!("₹{}", taxi.price_per_hour),
                "baseFare": quote.base_fare,
                "hourlyCharge": quote.hourly_charge,
                "minimumFare": quote.minimum_fare,
                "totalFare": quote.total_fare,
            },
        }),
        "Fare calculated successfully",
    ))
}
