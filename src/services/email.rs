//! Email service for booking confirmations and status notices

use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{Booking, BookingStatus},
};

#[derive(Clone)]
pub struct EmailService {
    config: EmailConfig,
}

/// Confirmation email body for a freshly reserved booking
fn reservation_body(booking: &Booking, qr_payload: &str) -> String {
    let state = match booking.status {
        BookingStatus::Confirmed => "is confirmed",
        _ => "has been received and is awaiting confirmation",
    };
    format!(
        r#"
Your booking {reference} {state}.

When: {date} from {start} to {end}

Show this code at the store when you arrive:
{qr}

To cancel, use your booking reference.
"#,
        reference = booking.reference,
        state = state,
        date = booking.start_time.format("%A %-d %B %Y"),
        start = booking.start_time.format("%-I:%M %p"),
        end = booking.end_time.format("%-I:%M %p"),
        qr = qr_payload,
    )
}

fn status_body(booking: &Booking) -> String {
    let mut body = format!(
        "\nYour booking {} on {} is now {}.\n",
        booking.reference,
        booking.start_time.format("%A %-d %B %Y at %-I:%M %p"),
        booking.status.as_str().replace('_', " "),
    );
    if let Some(reason) = booking.cancellation_reason.as_deref() {
        body.push_str(&format!("\nReason: {}\n", reason));
    }
    body
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the reservation confirmation with its QR payload
    pub async fn send_reservation(&self, to: &str, booking: &Booking, qr_payload: &str) -> AppResult<()> {
        let subject = format!("Your booking {}", booking.reference);
        self.send_email(to, &subject, &reservation_body(booking, qr_payload))
            .await
    }

    /// Notify a customer of a confirmation or cancellation
    pub async fn send_status_change(&self, to: &str, booking: &Booking) -> AppResult<()> {
        let subject = format!("Booking {} update", booking.reference);
        self.send_email(to, &subject, &status_body(booking)).await
    }

    /// Generic email sending function
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Slotbook");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer_builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer_builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => mailer_builder,
        };

        let mailer = mailer_builder.build();

        // SMTP transport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}
