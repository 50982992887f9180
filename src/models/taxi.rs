use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxi {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub taxi_type: String,
    pub category: String,
    pub base_price: f64,
    pub price_per_km: f64,
    pub price_per_hour: f64,
    pub minimum_fare: f64,
    pub capacity: i64,
    pub features: Vec<String>,
    pub available_areas: Vec<String>,
    pub fuel_type: String,
    pub transmission: String,
    pub ac: bool,
    pub driver_included: bool,
    pub image: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
