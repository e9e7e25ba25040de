//! Booking endpoints: reservation, lookups and lifecycle transitions

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        booking::{BookingListQuery, CreateBooking, TransitionRequest},
        Booking, BookingAction, BookingStatusChange, UserClaims,
    },
    AppState,
};

use super::AuthenticatedUser;

/// Reserve a slot
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Invalid request or business rule violated", body = crate::error::ErrorResponse),
        (status = 404, description = "Service, offer or store not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Slot no longer available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    if let Some(customer_id) = request.customer_id {
        claims.require_customer_access(customer_id)?;
    }

    let booking = state
        .services
        .reservations
        .reserve(request, claims.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Get booking details
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking details", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.reservations.get_booking(id).await?;
    claims.require_customer_access(booking.customer_id)?;
    Ok(Json(booking))
}

/// Status history of a booking
#[utoipa::path(
    get,
    path = "/bookings/{id}/history",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Status changes, oldest first", body = Vec<BookingStatusChange>),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_booking_history(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<BookingStatusChange>>> {
    let booking = state.services.reservations.get_booking(id).await?;
    claims.require_customer_access(booking.customer_id)?;

    let history = state.services.reservations.history(id).await?;
    Ok(Json(history))
}

/// Bookings of a customer
#[utoipa::path(
    get,
    path = "/customers/{id}/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Customer ID"),
        BookingListQuery
    ),
    responses(
        (status = 200, description = "Customer bookings", body = Vec<Booking>),
        (status = 403, description = "Not the customer", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_customer_bookings(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(customer_id): Path<i32>,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    claims.require_customer_access(customer_id)?;

    let bookings = state
        .services
        .reservations
        .list_customer_bookings(customer_id, query.active_only.unwrap_or(false))
        .await?;
    Ok(Json(bookings))
}

async fn staff_transition(
    state: &AppState,
    claims: &UserClaims,
    id: i32,
    action: BookingAction,
) -> AppResult<Json<Booking>> {
    claims.require_staff()?;
    let booking = state
        .services
        .reservations
        .transition(id, action, claims.user_id, None)
        .await?;
    Ok(Json(booking))
}

/// Confirm a pending booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/confirm",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking confirmed", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorResponse)
    )
)]
pub async fn confirm_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Booking>> {
    staff_transition(&state, &claims, id, BookingAction::Confirm).await
}

/// Check a customer in for a confirmed booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/check-in",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking in progress", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Booking>> {
    staff_transition(&state, &claims, id, BookingAction::CheckIn).await
}

/// Complete an in-progress booking
#[utoipa::path(
    post,
    path = "/bookings/{id}/complete",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking completed", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Booking>> {
    staff_transition(&state, &claims, id, BookingAction::Complete).await
}

/// Mark a confirmed booking as a no-show
#[utoipa::path(
    post,
    path = "/bookings/{id}/no-show",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking marked as no-show", body = Booking),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed from current status", body = crate::error::ErrorResponse)
    )
)]
pub async fn no_show_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Booking>> {
    staff_transition(&state, &claims, id, BookingAction::NoShow).await
}

/// Cancel a booking (its customer or staff)
#[utoipa::path(
    post,
    path = "/bookings/{id}/cancel",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body(content = TransitionRequest, description = "Optional cancellation reason"),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 403, description = "Not the booking's customer", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Booking already finished", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Option<Json<TransitionRequest>>,
) -> AppResult<Json<Booking>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    if !claims.is_staff() {
        let booking = state.services.reservations.get_booking(id).await?;
        claims.require_customer_access(booking.customer_id)?;
    }

    let booking = state
        .services
        .reservations
        .transition(id, BookingAction::Cancel, claims.user_id, request.reason)
        .await?;
    Ok(Json(booking))
}
