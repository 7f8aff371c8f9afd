//! Provider handlers for the REST API.

use axum::Json;
use axum::extract::{Path, State};

use slotwise_types::provider::{ProviderId, ProviderView, SetCapacityRequest};

use crate::http::error::AppError;
use crate::http::handlers::parse_id;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// GET /api/v1/providers - All providers ordered by name.
pub async fn list_providers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProviderView>>>, AppError> {
    let clock = RequestClock::start();
    let providers = state.booking_service.list_providers().await?;
    Ok(Json(clock.finish(providers).with_link("self", "/api/v1/providers")))
}

/// GET /api/v1/providers/{id}
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProviderView>>, AppError> {
    let clock = RequestClock::start();
    let id: ProviderId = parse_id("provider", &id)?;

    let provider = state.booking_service.get_provider(&id).await?;
    let resp = clock
        .finish(provider)
        .with_link("self", &format!("/api/v1/providers/{id}"))
        .with_link("bookings", &format!("/api/v1/bookings?provider_id={id}"));

    Ok(Json(resp))
}

/// PUT /api/v1/providers/{id}/capacity - Change a provider's total slots.
pub async fn set_capacity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SetCapacityRequest>,
) -> Result<Json<ApiResponse<ProviderView>>, AppError> {
    let clock = RequestClock::start();
    let id: ProviderId = parse_id("provider", &id)?;

    let provider = state
        .booking_service
        .set_capacity(&id, body.total_slots)
        .await?;
    let resp = clock
        .finish(ProviderView::from(provider))
        .with_link("self", &format!("/api/v1/providers/{id}"));

    Ok(Json(resp))
}
