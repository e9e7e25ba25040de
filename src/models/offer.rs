//! Offer model (promotional wrapper around a service)

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::text_column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Active,
    Expired,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Active => "active",
            OfferStatus::Expired => "expired",
        }
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(OfferStatus::Active),
            "expired" => Ok(OfferStatus::Expired),
            _ => Err(format!("Invalid offer status: {}", s)),
        }
    }
}

text_column!(OfferStatus);

/// Discounted offer; scheduling and capacity always come from its service
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Offer {
    pub id: i32,
    pub service_id: i32,
    pub title: String,
    pub discount_percentage: Decimal,
    pub status: OfferStatus,
    pub expiration_date: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
}

impl Offer {
    /// Whether the offer can still be booked at `now`
    pub fn is_bookable(&self, now: NaiveDateTime) -> bool {
        self.status == OfferStatus::Active
            && self.expiration_date.map(|exp| exp > now).unwrap_or(true)
    }
}
