//! Data models for Slotbook

pub mod availability;
pub mod booking;
pub mod claims;
pub mod offer;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use availability::{BookingRules, DetailedSlot, EntityType, SlotCheckResult, SlotsResult};
pub use booking::{
    Booking, BookingAction, BookingStatus, BookingStatusChange, NewBooking, Occupancy,
    ReservationResult, StatusTransition,
};
pub use claims::{Role, UserClaims};
pub use offer::{Offer, OfferStatus};
pub use service::Service;
pub use store::{Store, StoreStatus};

/// Store a string-backed enum in a TEXT column.
///
/// The type must provide `as_str()` and implement `FromStr<Err = String>`.
macro_rules! text_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = sqlx::Decode::<sqlx::Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl sqlx::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use text_column;
