//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availability, bookings, health};

/// Registers the `bearer_auth` scheme referenced by booking endpoints
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Slotbook API",
        version = "1.0.0",
        description = "Appointment slot availability and reservation REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::list_slots,
        availability::check_slot,
        // Bookings
        bookings::create_booking,
        bookings::get_booking,
        bookings::get_booking_history,
        bookings::list_customer_bookings,
        bookings::confirm_booking,
        bookings::check_in_booking,
        bookings::complete_booking,
        bookings::no_show_booking,
        bookings::cancel_booking,
    ),
    components(
        schemas(
            // Availability
            crate::models::availability::EntityType,
            crate::models::availability::BookingRules,
            crate::models::availability::DetailedSlot,
            crate::models::availability::UnavailableKind,
            crate::models::availability::SlotsResponse,
            crate::models::availability::SlotCheckResponse,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::BookingAction,
            crate::models::booking::BookingStatusChange,
            crate::models::booking::CreateBooking,
            crate::models::booking::TransitionRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Slot listings and slot checks"),
        (name = "bookings", description = "Reservations and booking lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
