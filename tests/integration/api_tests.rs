//! API integration tests (server running on localhost:8080)

use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use slotbook_server::models::{Role, UserClaims};

use crate::db::{booking_day, pool, seed};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Token signed with the server's secret
fn token(user_id: i32, role: Role) -> String {
    let secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    UserClaims {
        sub: format!("user-{}", user_id),
        user_id,
        role,
        exp: Utc::now().timestamp() + 3600,
        iat: Utc::now().timestamp(),
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_ready_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_list_slots() {
    let pool = pool().await;
    let seeded = seed(&pool, 2).await;
    let client = Client::new();

    let response = client
        .get(format!("{}/availability/slots", BASE_URL))
        .query(&[
            ("entity_id", seeded.service_id.to_string()),
            ("entity_type", "service".to_string()),
            ("date", booking_day().to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert_eq!(body["detailed_slots"].as_array().map(|s| s.len()), Some(8));
    assert_eq!(body["available_slots"][0], "9:00 AM");
    assert_eq!(body["booking_rules"]["max_concurrent_bookings"], 2);
}

#[tokio::test]
#[ignore]
async fn test_list_slots_errors() {
    let client = Client::new();

    let response = client
        .get(format!("{}/availability/slots", BASE_URL))
        .query(&[
            ("entity_id", "999999"),
            ("entity_type", "service"),
            ("date", "2030-01-01"),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let pool = pool().await;
    let seeded = seed(&pool, 1).await;
    let response = client
        .get(format!("{}/availability/slots", BASE_URL))
        .query(&[
            ("entity_id", seeded.service_id.to_string()),
            ("entity_type", "service".to_string()),
            ("date", "2020-01-01".to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert_eq!(body["kind"], "past_date");
}

#[tokio::test]
#[ignore]
async fn test_reserve_until_full() {
    let pool = pool().await;
    let seeded = seed(&pool, 1).await;
    let client = Client::new();
    let customer = token(seeded.customer_id, Role::Customer);
    let start = format!("{}T10:00", booking_day());

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", customer))
        .json(&json!({
            "entity_id": seeded.service_id,
            "entity_type": "service",
            "start_time": start,
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["customer_id"], seeded.customer_id);
    let booking_id = body["id"].as_i64().expect("No booking ID");

    let response = client
        .get(format!("{}/availability/check", BASE_URL))
        .query(&[
            ("entity_id", seeded.service_id.to_string()),
            ("entity_type", "service".to_string()),
            ("date", booking_day().to_string()),
            ("time", "10:00".to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["available"], false);
    assert_eq!(body["remaining_slots"], 0);

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", customer))
        .json(&json!({
            "entity_id": seeded.offer_id,
            "entity_type": "offer",
            "start_time": start,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // Customers cannot confirm their own booking
    let response = client
        .post(format!("{}/bookings/{}/confirm", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", customer))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/bookings/{}/cancel", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", customer))
        .json(&json!({ "reason": "Running late" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "cancelled");

    let response = client
        .post(format!("{}/bookings/{}/cancel", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", token(1, Role::Staff)))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_booking_requires_token() {
    let client = Client::new();

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "entity_id": 1,
            "entity_type": "service",
            "start_time": "2030-01-01T10:00",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
