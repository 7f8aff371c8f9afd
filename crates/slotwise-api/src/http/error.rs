//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use slotwise_types::error::SlotError;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Engine or service errors.
    Slot(SlotError),
    /// Malformed path or query input.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<SlotError> for AppError {
    fn from(e: SlotError) -> Self {
        AppError::Slot(e)
    }
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Slot(e) => match e {
                SlotError::ProviderNotFound(_) => (StatusCode::NOT_FOUND, "PROVIDER_NOT_FOUND"),
                SlotError::BookingNotFound(_) => (StatusCode::NOT_FOUND, "BOOKING_NOT_FOUND"),
                SlotError::SlotsExhausted { .. } => (StatusCode::CONFLICT, "SLOTS_EXHAUSTED"),
                SlotError::AlreadyTerminal { .. } => (StatusCode::CONFLICT, "ALREADY_TERMINAL"),
                SlotError::DuplicateBooking { .. } => (StatusCode::CONFLICT, "DUPLICATE_BOOKING"),
                SlotError::CapacityBelowActive { .. } => {
                    (StatusCode::CONFLICT, "CAPACITY_BELOW_ACTIVE")
                }
                SlotError::InvalidTransition { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TRANSITION")
                }
                SlotError::Busy { .. } => (StatusCode::SERVICE_UNAVAILABLE, "BUSY"),
                SlotError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                SlotError::CapacityExceeded { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTEGRITY_VIOLATION")
                }
                SlotError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            },
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Slot(e) => e.to_string(),
            AppError::Validation(msg) | AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(code, error = %self.message(), "request failed");
        }

        let request_id = uuid::Uuid::now_v7().to_string();
        let body = ApiResponse::error(code, &self.message(), request_id, 0);
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotwise_types::booking::BookingStatus;
    use slotwise_types::provider::ProviderId;

    #[test]
    fn slot_errors_map_to_status_codes() {
        let cases = [
            (
                SlotError::ProviderNotFound(ProviderId::new()),
                StatusCode::NOT_FOUND,
            ),
            (
                SlotError::SlotsExhausted {
                    provider_id: ProviderId::new(),
                    total_slots: 4,
                },
                StatusCode::CONFLICT,
            ),
            (
                SlotError::InvalidTransition {
                    from: BookingStatus::Pending,
                    to: BookingStatus::Completed,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                SlotError::Busy {
                    resource: "provider".into(),
                    waited_ms: 50,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SlotError::CapacityExceeded {
                    provider_id: ProviderId::new(),
                    total_slots: 4,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status_and_code().0, expected);
        }
    }

    #[test]
    fn validation_is_bad_request() {
        let (status, code) = AppError::Validation("bad id".into()).status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
    }
}
