use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub pickup_location: String,
    pub drop_location: String,
    pub pickup_date: String,
    pub pickup_time: String,
    pub service_type: ServiceType,
    pub service_id: String,
    pub service_name: String,
    pub passengers: i64,
    pub distance: f64,
    pub hours: f64,
    pub total_amount: f64,
    pub special_requests: String,
    pub status: BookingStatus,
    pub booking_number: String,
    pub created_by: CreatedBy,
    pub created_by_user_id: Option<String>,
    pub service_admin: String,
    pub service_details: ServiceDetails,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Point-in-time copy of the booked service. Later edits to the catalog
/// record must not show through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDetails {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub duration: String,
    pub price: String,
    pub category: String,
    pub capacity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Directed transition graph: pending may confirm or cancel, confirmed
    /// may complete or cancel, completed and cancelled are terminal.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatedBy {
    User,
    Admin,
}

impl CreatedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatedBy::User => "user",
            CreatedBy::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => CreatedBy::Admin,
            _ => CreatedBy::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Taxi,
    Tour,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Taxi => "taxi",
            ServiceType::Tour => "tour",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "taxi" => Some(ServiceType::Taxi),
            "tour" => Some(ServiceType::Tour),
            _ => None,
        }
    }
}
