use chrono::NaiveDateTime;
use serde::Serialize;

/// Tour price is a display string on purpose; the catalog carries entries
/// like "On Request" alongside fixed amounts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub tour_type: String,
    pub duration: String,
    pub price: String,
    pub category: String,
    pub features: Vec<String>,
    pub inclusions: Vec<String>,
    pub places: Vec<String>,
    pub image: String,
    pub max_capacity: i64,
    pub min_capacity: i64,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
