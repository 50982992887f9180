use chrono::{Local, Utc};
use rand::Rng;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, CreatedBy, ServiceDetails, ServiceType, User};

/// Raw request body for booking creation. Everything is optional at the type
/// level; defaults and the minimal-required check happen in `create_booking`
/// so the caller gets one structured "missing" list instead of a deserialize
/// failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub pickup_location: Option<String>,
    pub drop_location: Option<String>,
    pub pickup_date: Option<String>,
    pub pickup_time: Option<String>,
    pub service_type: Option<String>,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub passengers: Option<i64>,
    pub distance: Option<f64>,
    pub hours: Option<f64>,
    pub total_amount: Option<f64>,
    pub special_requests: Option<String>,
}

/// What the booking actually needs from a resolved catalog record,
/// regardless of which variant it came from.
#[derive(Debug, Clone)]
pub struct ResolvedService {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub details: ServiceDetails,
}

/// Dual-path lookup: strict id first (only when the id is a well-formed
/// UUID), then exact-name fallback. The fallback exists because the front
/// end sometimes only has a display name for the service. `None` means
/// neither path matched; no error is used for control flow.
pub fn resolve_service(
    conn: &Connection,
    service_type: ServiceType,
    service_id: Option<&str>,
    service_name: &str,
) -> anyhow::Result<Option<ResolvedService>> {
    let id_candidate = service_id.filter(|id| Uuid::parse_str(id).is_ok());

    match service_type {
        ServiceType::Taxi => {
            let mut taxi = match id_candidate {
                Some(id) => queries::get_taxi_by_id(conn, id)?,
                None => None,
            };
            if taxi.is_none() && !service_name.is_empty() {
                taxi = queries::find_taxi_by_name(conn, service_name)?;
            }

            Ok(taxi.map(|t| ResolvedService {
                details: ServiceDetails {
                    name: t.name.clone(),
                    service_type: t.taxi_type.clone(),
                    duration: "As per booking".to_string(),
                    price: format!("₹{}/km", t.price_per_km),
                    category: t.category.clone(),
                    capacity: t.capacity,
                },
                id: t.id,
                name: t.name,
                owner: t.created_by,
            }))
        }
        ServiceType::Tour => {
            let mut tour = match id_candidate {
                Some(id) => queries::get_tour_by_id(conn, id)?,
                None => None,
            };
            if tour.is_none() && !service_name.is_empty() {
                tour = queries::find_tour_by_name(conn, service_name)?;
            }

            Ok(tour.map(|t| ResolvedService {
                details: ServiceDetails {
                    name: t.name.clone(),
                    service_type: t.tour_type.clone(),
                    duration: t.duration.clone(),
                    price: t.price.clone(),
                    category: t.category.clone(),
                    capacity: t.max_capacity,
                },
                id: t.id,
                name: t.name,
                owner: t.created_by,
            }))
        }
    }
}

/// Prefix + creation millis + a 3-digit random suffix. Unique in practice
/// without a database sequence.
pub fn generate_booking_number() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("JT{}{:03}", Utc::now().timestamp_millis(), suffix)
}

fn trimmed(value: Option<String>) -> String {
    value.unwrap_or_default().trim().to_string()
}

fn trimmed_or(value: Option<String>, fallback: &str) -> String {
    let v = trimmed(value);
    if v.is_empty() {
        fallback.to_string()
    } else {
        v
    }
}

/// Booking creation per the documented contract: identify the caller from an
/// optional token, fill defaults, validate the minimal field set, resolve
/// the service, snapshot its details, and persist as `pending`.
pub fn create_booking(
    conn: &Connection,
    req: BookingRequest,
    caller: Option<&User>,
) -> Result<Booking, AppError> {
    let (created_by, created_by_user_id) = match caller {
        Some(user) if user.role.is_admin() => (CreatedBy::Admin, Some(user.id.clone())),
        Some(user) => (CreatedBy::User, Some(user.id.clone())),
        None => (CreatedBy::User, None),
    };

    let now = Local::now().naive_local();

    let customer_name = trimmed(req.customer_name);
    let customer_phone = trimmed(req.customer_phone);
    let customer_email = req
        .customer_email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let pickup_location = trimmed_or(req.pickup_location, "N/A");
    let drop_location = trimmed_or(req.drop_location, &pickup_location);
    let pickup_date = trimmed_or(req.pickup_date, &now.format("%Y-%m-%d").to_string());
    let pickup_time = trimmed_or(req.pickup_time, &now.format("%H:%M").to_string());
    let service_type_raw = trimmed(req.service_type);
    let service_id = req.service_id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let service_name = trimmed(req.service_name);

    let mut missing = vec![];
    if customer_name.is_empty() {
        missing.push("customerName".to_string());
    }
    if customer_phone.is_empty() {
        missing.push("customerPhone".to_string());
    }
    if service_type_raw.is_empty() {
        missing.push("serviceType".to_string());
    }
    if service_id.is_none() && service_name.is_empty() {
        missing.push("serviceId|serviceName".to_string());
    }
    if !missing.is_empty() {
        tracing::warn!("create booking missing fields: {missing:?}");
        return Err(AppError::MissingFields(missing));
    }

    let service_type = ServiceType::parse(&service_type_raw).ok_or_else(|| {
        AppError::Validation("serviceType must be 'taxi' or 'tour'".to_string())
    })?;

    let resolved = resolve_service(conn, service_type, service_id.as_deref(), &service_name)?
        .ok_or_else(|| {
            let label = match service_type {
                ServiceType::Taxi => "Taxi",
                ServiceType::Tour => "Tour",
            };
            AppError::NotFound(format!("{label} not found for provided serviceId"))
        })?;

    let created_at = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        customer_name,
        customer_phone,
        customer_email,
        pickup_location,
        drop_location,
        pickup_date,
        pickup_time,
        service_type,
        service_id: resolved.id,
        service_name: resolved.name,
        passengers: req.passengers.unwrap_or(1),
        distance: req.distance.unwrap_or(0.0),
        hours: req.hours.unwrap_or(0.0),
        total_amount: req.total_amount.unwrap_or(0.0),
        special_requests: trimmed(req.special_requests),
        status: BookingStatus::Pending,
        booking_number: generate_booking_number(),
        created_by,
        created_by_user_id,
        service_admin: resolved.owner,
        service_details: resolved.details,
        created_at,
        updated_at: created_at,
    };

    queries::create_booking(conn, &booking)?;
    Ok(booking)
}
