//! Query parameter extractors for list endpoints.

use chrono::NaiveDate;
use serde::Deserialize;

use slotwise_core::repository::SortOrder;
use slotwise_core::repository::booking::BookingFilter;
use slotwise_types::booking::BookingStatus;
use slotwise_types::provider::ProviderId;

use crate::http::error::AppError;

/// Query parameters for the booking list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct BookingListQuery {
    /// Comma-separated statuses (pending, confirmed, in-progress, completed,
    /// cancelled). Also accepts `active` as shorthand for the slot-holding
    /// statuses.
    pub status: Option<String>,
    /// Only bookings against this provider.
    pub provider_id: Option<String>,
    /// Only bookings for this client phone.
    pub phone: Option<String>,
    /// Only bookings on this appointment date (YYYY-MM-DD).
    pub date: Option<NaiveDate>,
    /// Sort order on creation time (asc, desc).
    #[serde(default = "default_order")]
    pub order: String,
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}

fn default_order() -> String {
    "desc".to_string()
}

/// Parse a comma-separated status list. `active` expands to every
/// slot-holding status.
pub fn parse_statuses(raw: &str) -> Result<Vec<BookingStatus>, String> {
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if part.eq_ignore_ascii_case("active") {
            statuses.extend(BookingStatus::ACTIVE);
        } else {
            statuses.push(part.parse::<BookingStatus>()?);
        }
    }
    statuses.dedup();
    Ok(statuses)
}

impl BookingListQuery {
    /// Convert into a repository filter, validating each parameter.
    pub fn into_filter(self) -> Result<BookingFilter, AppError> {
        let statuses = match &self.status {
            Some(raw) => parse_statuses(raw).map_err(AppError::Validation)?,
            None => Vec::new(),
        };

        let provider_id = match &self.provider_id {
            Some(raw) => Some(
                raw.parse::<ProviderId>()
                    .map_err(|_| AppError::Validation(format!("invalid provider id '{raw}'")))?,
            ),
            None => None,
        };

        let sort_order = match self.order.to_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        Ok(BookingFilter {
            statuses,
            provider_id,
            client_phone: self.phone,
            appointment_date: self.date,
            created_before: None,
            sort_order: Some(sort_order),
            limit: self.limit,
            offset: self.offset,
        })
    }
}
