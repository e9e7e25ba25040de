//! Store model (operating entity owning services)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::text_column;

/// Store activity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for StoreStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(StoreStatus::Active),
            "inactive" => Ok(StoreStatus::Inactive),
            _ => Err(format!("Invalid store status: {}", s)),
        }
    }
}

text_column!(StoreStatus);

/// Store record as consumed by the availability engine
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Store {
    pub id: i32,
    pub merchant_id: i32,
    pub name: String,
    /// Local wall-clock opening time (e.g. "09:00")
    pub opening_time: Option<String>,
    /// Local wall-clock closing time (e.g. "17:00")
    pub closing_time: Option<String>,
    /// Open weekday names: a JSON array, a JSON-encoded string or a comma-separated string
    #[schema(value_type = Object)]
    pub working_days: Option<serde_json::Value>,
    pub status: StoreStatus,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}
