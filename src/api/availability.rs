//! Slot availability endpoints (public, read-only)

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{
            SlotCheckQuery, SlotCheckResponse, SlotQuery, SlotsResponse, Unavailability,
            UnavailableKind,
        },
        SlotCheckResult, SlotsResult,
    },
    AppState,
};

/// Unknown entities and malformed input are errors; business rules are answers
fn as_error(unavailable: &Unavailability) -> Option<AppError> {
    match unavailable.kind {
        UnavailableKind::NotFound => Some(AppError::NotFound(unavailable.reason.clone())),
        UnavailableKind::InvalidInput => Some(AppError::Validation(unavailable.reason.clone())),
        _ => None,
    }
}

/// List bookable slots of a service or offer on a date
#[utoipa::path(
    get,
    path = "/availability/slots",
    tag = "availability",
    params(SlotQuery),
    responses(
        (status = 200, description = "Open slots with remaining capacity", body = SlotsResponse),
        (status = 400, description = "Store closed, booking disabled or invalid date", body = SlotsResponse),
        (status = 404, description = "Service, offer or store not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> AppResult<(StatusCode, Json<SlotsResponse>)> {
    let result = state
        .services
        .availability
        .list_slots(query.entity_id, query.entity_type, &query.date)
        .await?;

    let status = match &result {
        SlotsResult::Listed(_) => StatusCode::OK,
        SlotsResult::Unavailable(u) => match as_error(u) {
            Some(err) => return Err(err),
            None => StatusCode::BAD_REQUEST,
        },
    };

    Ok((status, Json(result.into())))
}

/// Check whether one slot can still be booked.
///
/// The answer is advisory: a reservation re-checks capacity under lock.
#[utoipa::path(
    get,
    path = "/availability/check",
    tag = "availability",
    params(SlotCheckQuery),
    responses(
        (status = 200, description = "Slot availability", body = SlotCheckResponse),
        (status = 400, description = "Invalid date or time", body = crate::error::ErrorResponse),
        (status = 404, description = "Service, offer or store not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_slot(
    State(state): State<AppState>,
    Query(query): Query<SlotCheckQuery>,
) -> AppResult<Json<SlotCheckResponse>> {
    let result = state
        .services
        .availability
        .check_slot(query.entity_id, query.entity_type, &query.date, &query.time)
        .await?;

    if let SlotCheckResult::Unavailable(u) = &result {
        if let Some(err) = as_error(u) {
            return Err(err);
        }
    }

    Ok(Json(result.into()))
}
