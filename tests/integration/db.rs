//! Database fixtures shared by the integration tests

use chrono::{Duration, Local, NaiveDate};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Pool on `DATABASE_URL`, migrated
pub async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A day a week ahead, inside every seeded booking window
pub fn booking_day() -> NaiveDate {
    Local::now().date_naive() + Duration::days(7)
}

pub struct Seeded {
    pub store_id: i32,
    pub service_id: i32,
    pub offer_id: i32,
    pub customer_id: i32,
}

/// Store open every day 09:00-17:00 with a one-hour service of the given capacity
pub async fn seed(pool: &PgPool, capacity: i32) -> Seeded {
    let store_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO stores (merchant_id, name, opening_time, closing_time, working_days, status)
        VALUES (1, 'Integration store', '09:00', '17:00',
                '["Monday","Tuesday","Wednesday","Thursday","Friday","Saturday","Sunday"]'::jsonb,
                'active')
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed store");

    let service_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO services (store_id, name, duration, buffer_time, max_concurrent_bookings,
                              min_advance_booking, max_advance_booking)
        VALUES ($1, 'Integration service', 60, 0, $2, 0, 43200)
        RETURNING id
        "#,
    )
    .bind(store_id)
    .bind(capacity)
    .fetch_one(pool)
    .await
    .expect("Failed to seed service");

    let offer_id: i32 = sqlx::query_scalar(
        "INSERT INTO offers (service_id, title, discount_percentage) VALUES ($1, 'Integration offer', 10) RETURNING id",
    )
    .bind(service_id)
    .fetch_one(pool)
    .await
    .expect("Failed to seed offer");

    let customer_id: i32 = sqlx::query_scalar(
        "INSERT INTO customers (name, email) VALUES ('Integration customer', 'customer@example.com') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .expect("Failed to seed customer");

    Seeded {
        store_id,
        service_id,
        offer_id,
        customer_id,
    }
}
