//! Dashboard statistics endpoint.
//!
//! GET /api/v1/stats - Slot totals across providers and booking counts by
//! status.

use axum::Json;
use axum::extract::State;

use slotwise_types::booking::SlotStats;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SlotStats>>, AppError> {
    let clock = RequestClock::start();
    let stats = state.booking_service.stats().await?;

    let resp = clock
        .finish(stats)
        .with_link("self", "/api/v1/stats")
        .with_link("providers", "/api/v1/providers")
        .with_link("bookings", "/api/v1/bookings");

    Ok(Json(resp))
}
