//! Bookings repository: occupancy reads, the locked reservation transaction
//! and status transitions

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{Pool, Postgres, Transaction};

use super::BookingRepository;
use crate::{
    error::{AppError, AppResult},
    models::{
        Booking, BookingStatus, BookingStatusChange, NewBooking, Occupancy, ReservationResult,
        StatusTransition,
    },
    services::capacity,
};

/// Overlapping active bookings of a service, direct or through its offers.
/// $1 service, $2 interval start, $3 interval end, $4 released statuses.
const OVERLAPPING_ACTIVE: &str = r#"
    SELECT b.id AS booking_id, b.start_time, b.end_time
    FROM bookings b
    WHERE (b.service_id = $1
           OR b.offer_id IN (SELECT o.id FROM offers o WHERE o.service_id = $1))
      AND b.status <> ALL($4)
      AND b.start_time < $3
      AND b.end_time > $2
"#;

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
    read_pool: Pool<Postgres>,
    lock_timeout_ms: u64,
}

/// Width of an advisory lock bucket, in seconds
const LOCK_BUCKET_SECS: i64 = 15 * 60;

/// Advisory lock keys of every 15-minute bucket `[start, end)` touches, in
/// ascending order. Two overlapping intervals always share a key, whichever
/// grid produced them.
fn interval_lock_keys(start: NaiveDateTime, end: NaiveDateTime) -> Vec<i32> {
    let first = start.and_utc().timestamp().div_euclid(LOCK_BUCKET_SECS);
    let last = (end.and_utc().timestamp() - 1).div_euclid(LOCK_BUCKET_SECS);
    (first..=last.max(first))
        .map(|bucket| (bucket & i64::from(i32::MAX)) as i32)
        .collect()
}

fn timestamp_column(status: BookingStatus) -> Option<&'static str> {
    match status {
        BookingStatus::Confirmed => Some("confirmed_at"),
        BookingStatus::InProgress => Some("checked_in_at"),
        BookingStatus::Completed => Some("completed_at"),
        BookingStatus::Cancelled => Some("cancelled_at"),
        BookingStatus::NoShow => Some("no_show_at"),
        BookingStatus::Pending => None,
    }
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>, read_pool: Pool<Postgres>, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            read_pool,
            lock_timeout_ms,
        }
    }

    /// Store the QR payload generated after commit
    pub async fn set_qr_payload(&self, booking_id: i32, payload: &str) -> AppResult<()> {
        sqlx::query("UPDATE bookings SET qr_payload = $1 WHERE id = $2")
            .bind(payload)
            .bind(booking_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Contact email of a customer, if any
    pub async fn customer_email(&self, customer_id: i32) -> AppResult<Option<String>> {
        let email: Option<Option<String>> =
            sqlx::query_scalar("SELECT email FROM customers WHERE id = $1")
                .bind(customer_id)
                .fetch_optional(&self.read_pool)
                .await?;
        Ok(email.flatten())
    }

    async fn log_status(
        tx: &mut Transaction<'static, Postgres>,
        booking_id: i32,
        from: Option<BookingStatus>,
        to: BookingStatus,
        actor_id: i32,
        reason: Option<&str>,
        at: NaiveDateTime,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO booking_status_log (booking_id, from_status, to_status, actor_id, reason, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(actor_id)
        .bind(reason)
        .bind(at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BookingRepository for BookingsRepository {
    async fn occupancy(
        &self,
        service_id: i32,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<Occupancy>> {
        let query = format!("{} ORDER BY b.start_time", OVERLAPPING_ACTIVE);
        let rows = sqlx::query_as::<_, Occupancy>(&query)
            .bind(service_id)
            .bind(from)
            .bind(to)
            .bind(&BookingStatus::RELEASED[..])
            .fetch_all(&self.read_pool)
            .await?;
        Ok(rows)
    }

    async fn reserve(&self, booking: NewBooking) -> AppResult<ReservationResult> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;

        // Overlapping attempts on a service share a bucket and queue here.
        // Keys are taken in ascending order so waiters cannot deadlock.
        for key in interval_lock_keys(booking.start_time, booking.end_time) {
            sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
                .bind(booking.service_id)
                .bind(key)
                .execute(&mut *tx)
                .await?;
        }

        let capacity: i32 =
            sqlx::query_scalar("SELECT max_concurrent_bookings FROM services WHERE id = $1")
                .bind(booking.service_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Service {} not found", booking.service_id))
                })?;

        let query = format!("{} FOR UPDATE OF b", OVERLAPPING_ACTIVE);
        let locked = sqlx::query_as::<_, Occupancy>(&query)
            .bind(booking.service_id)
            .bind(booking.start_time)
            .bind(booking.end_time)
            .bind(&BookingStatus::RELEASED[..])
            .fetch_all(&mut *tx)
            .await?;

        let overlapping = capacity::overlap_count(booking.start_time, booking.end_time, &locked);
        if capacity::remaining(capacity, overlapping) == 0 {
            tx.rollback().await?;
            return Ok(ReservationResult::SlotUnavailable {
                overlapping,
                capacity,
            });
        }

        let confirmed_at = (booking.status == BookingStatus::Confirmed).then_some(booking.created_at);

        let created = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                reference, service_id, offer_id, customer_id, staff_id, store_id, branch_id,
                start_time, end_time, status, notes, confirmed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING *
            "#,
        )
        .bind(booking.reference)
        .bind(booking.service_id)
        .bind(booking.offer_id)
        .bind(booking.customer_id)
        .bind(booking.staff_id)
        .bind(booking.store_id)
        .bind(booking.branch_id)
        .bind(booking.start_time)
        .bind(booking.end_time)
        .bind(booking.status)
        .bind(&booking.notes)
        .bind(confirmed_at)
        .bind(booking.created_at)
        .fetch_one(&mut *tx)
        .await?;

        Self::log_status(
            &mut tx,
            created.id,
            None,
            created.status,
            booking.actor_id,
            None,
            booking.created_at,
        )
        .await?;

        tx.commit().await?;

        Ok(ReservationResult::Reserved(created))
    }

    async fn get_booking(&self, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    async fn list_customer_bookings(
        &self,
        customer_id: i32,
        active_only: bool,
    ) -> AppResult<Vec<Booking>> {
        let rows = if active_only {
            sqlx::query_as::<_, Booking>(
                "SELECT * FROM bookings WHERE customer_id = $1 AND status <> ALL($2) ORDER BY start_time",
            )
            .bind(customer_id)
            .bind(&BookingStatus::RELEASED[..])
            .fetch_all(&self.read_pool)
            .await?
        } else {
            sqlx::query_as::<_, Booking>(
                "SELECT * FROM bookings WHERE customer_id = $1 ORDER BY start_time DESC",
            )
            .bind(customer_id)
            .fetch_all(&self.read_pool)
            .await?
        };
        Ok(rows)
    }

    async fn transition(&self, transition: StatusTransition) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let mut sets = vec!["status = $1".to_string(), "updated_at = $2".to_string()];
        if let Some(column) = timestamp_column(transition.to) {
            sets.push(format!("{} = $2", column));
        }
        if transition.to == BookingStatus::Cancelled {
            sets.push("cancellation_reason = $5".to_string());
        }

        let query = format!(
            "UPDATE bookings SET {} WHERE id = $3 AND status = $4 RETURNING *",
            sets.join(", ")
        );

        let mut builder = sqlx::query_as::<_, Booking>(&query)
            .bind(transition.to)
            .bind(transition.at)
            .bind(transition.booking_id)
            .bind(transition.from);
        if transition.to == BookingStatus::Cancelled {
            builder = builder.bind(&transition.reason);
        }

        let updated = match builder.fetch_optional(&mut *tx).await? {
            Some(booking) => booking,
            None => {
                tx.rollback().await?;
                // Lost a race with another transition, or the booking is gone
                let current = self.get_booking(transition.booking_id).await?;
                return Err(AppError::InvalidTransition(format!(
                    "booking {} is now {}",
                    current.id, current.status
                )));
            }
        };

        Self::log_status(
            &mut tx,
            updated.id,
            Some(transition.from),
            transition.to,
            transition.actor_id,
            transition.reason.as_deref(),
            transition.at,
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn history(&self, booking_id: i32) -> AppResult<Vec<BookingStatusChange>> {
        let rows = sqlx::query_as::<_, BookingStatusChange>(
            "SELECT * FROM booking_status_log WHERE booking_id = $1 ORDER BY changed_at, id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
