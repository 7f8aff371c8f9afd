//! Booking handlers for the REST API.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use slotwise_types::booking::{
    Booking, BookingId, CreateBookingRequest, RescheduleRequest, TransitionRequest,
};

use crate::http::error::AppError;
use crate::http::extractors::query::BookingListQuery;
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

fn booking_response(clock: RequestClock, booking: Booking) -> ApiResponse<Booking> {
    let self_link = format!("/api/v1/bookings/{}", booking.id);
    let provider_link = format!("/api/v1/providers/{}", booking.provider_id);
    clock
        .finish(booking)
        .with_link("self", &self_link)
        .with_link("provider", &provider_link)
}

/// POST /api/v1/bookings - Create a booking, consuming one of the
/// provider's slots.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Booking>>), AppError> {
    let clock = RequestClock::start();
    let booking = state.booking_service.create_booking(body).await?;
    Ok((StatusCode::CREATED, Json(booking_response(clock, booking))))
}

/// GET /api/v1/bookings - List bookings with filtering and pagination.
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let clock = RequestClock::start();
    let filter = query.into_filter()?;

    let bookings = state.booking_service.list_bookings(filter).await?;
    Ok(Json(clock.finish(bookings).with_link("self", "/api/v1/bookings")))
}

/// GET /api/v1/bookings/{id}
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let clock = RequestClock::start();
    let id: BookingId = parse_id("booking", &id)?;

    let booking = state.booking_service.get_booking(&id).await?;
    Ok(Json(booking_response(clock, booking)))
}

/// POST /api/v1/bookings/{id}/transition - Move a booking along its lifecycle.
pub async fn transition_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let clock = RequestClock::start();
    let id: BookingId = parse_id("booking", &id)?;

    let booking = state
        .booking_service
        .transition_booking(&id, body.status)
        .await?;
    Ok(Json(booking_response(clock, booking)))
}

/// PUT /api/v1/bookings/{id}/schedule - Move an active booking to another date.
pub async fn reschedule_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let clock = RequestClock::start();
    let id: BookingId = parse_id("booking", &id)?;

    let booking = state
        .booking_service
        .reschedule_booking(&id, body.appointment_date)
        .await?;
    Ok(Json(booking_response(clock, booking)))
}
