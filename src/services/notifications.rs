//! Post-commit side effects: QR payloads and customer emails
//!
//! Nothing here runs inside a reservation transaction. Callers spawn these
//! hooks after commit and only log their failures.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::email::EmailService;
use crate::{
    config::NotificationsConfig,
    error::AppResult,
    models::{Booking, BookingStatus},
    repository::bookings::BookingsRepository,
};

/// Hooks invoked with committed bookings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn booking_reserved(&self, booking: Booking) -> AppResult<()>;

    async fn booking_status_changed(&self, booking: Booking, from: BookingStatus) -> AppResult<()>;
}

/// Scannable payload identifying a booking: base64 of
/// `booking:<reference>:<sha256(reference:secret) hex>`
pub fn qr_payload(reference: Uuid, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", reference, secret).as_bytes());
    let digest = hex::encode(hasher.finalize());
    STANDARD.encode(format!("booking:{}:{}", reference, digest))
}

/// Check a scanned payload against its booking reference
#[cfg(test)]
pub fn verify_qr_payload(payload: &str, reference: Uuid, secret: &str) -> bool {
    qr_payload(reference, secret) == payload
}

/// Persists the QR payload and emails the customer when enabled
#[derive(Clone)]
pub struct EmailNotifier {
    bookings: BookingsRepository,
    email: Option<EmailService>,
    qr_secret: String,
}

impl EmailNotifier {
    pub fn new(bookings: BookingsRepository, config: &NotificationsConfig) -> Self {
        Self {
            bookings,
            email: config
                .enabled
                .then(|| EmailService::new(config.email.clone())),
            qr_secret: config.qr_secret.clone(),
        }
    }
}

#[async_trait]
impl BookingNotifier for EmailNotifier {
    async fn booking_reserved(&self, booking: Booking) -> AppResult<()> {
        let payload = qr_payload(booking.reference, &self.qr_secret);
        self.bookings.set_qr_payload(booking.id, &payload).await?;

        let Some(email) = &self.email else {
            return Ok(());
        };
        match self.bookings.customer_email(booking.customer_id).await? {
            Some(to) => email.send_reservation(&to, &booking, &payload).await,
            None => {
                tracing::debug!("Customer {} has no email address", booking.customer_id);
                Ok(())
            }
        }
    }

    async fn booking_status_changed(&self, booking: Booking, from: BookingStatus) -> AppResult<()> {
        let Some(email) = &self.email else {
            return Ok(());
        };
        // Customers only hear about decisions on their booking
        if !matches!(
            booking.status,
            BookingStatus::Confirmed | BookingStatus::Cancelled
        ) {
            return Ok(());
        }
        tracing::debug!(
            "Notifying customer {} of booking {} {} -> {}",
            booking.customer_id,
            booking.id,
            from,
            booking.status
        );
        match self.bookings.customer_email(booking.customer_id).await? {
            Some(to) => email.send_status_change(&to, &booking).await,
            None => Ok(()),
        }
    }
}
