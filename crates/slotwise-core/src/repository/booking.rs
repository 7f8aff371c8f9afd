//! Booking repository trait definition.

use chrono::{DateTime, NaiveDate, Utc};
use slotwise_types::booking::{Booking, BookingId, BookingStatus};
use slotwise_types::error::RepositoryError;
use slotwise_types::provider::ProviderId;

use super::SortOrder;

/// Filter criteria for listing bookings.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    /// Match any of these statuses. Empty matches all.
    pub statuses: Vec<BookingStatus>,
    /// Only bookings against this provider.
    pub provider_id: Option<ProviderId>,
    /// Only bookings for this client phone.
    pub client_phone: Option<String>,
    /// Only bookings on this appointment date.
    pub appointment_date: Option<NaiveDate>,
    /// Only bookings created strictly before this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Sort direction on `created_at`. Defaults to newest first.
    pub sort_order: Option<SortOrder>,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Number of results to skip (offset pagination).
    pub offset: Option<i64>,
}

impl BookingFilter {
    /// Whether `booking` satisfies every criterion except ordering and
    /// pagination.
    pub fn matches(&self, booking: &Booking) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&booking.status))
            && self
                .provider_id
                .is_none_or(|id| id == booking.provider_id)
            && self
                .client_phone
                .as_deref()
                .is_none_or(|phone| phone == booking.details.client_phone)
            && self
                .appointment_date
                .is_none_or(|date| date == booking.details.appointment_date)
            && self
                .created_before
                .is_none_or(|cutoff| booking.created_at < cutoff)
    }
}

/// Repository trait for booking persistence.
///
/// Bookings are never deleted; terminal records stay for history.
pub trait BookingRepository: Send + Sync {
    /// Store a new booking.
    fn insert(
        &self,
        booking: &Booking,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a booking by its unique ID.
    fn get(
        &self,
        id: &BookingId,
    ) -> impl std::future::Future<Output = Result<Option<Booking>, RepositoryError>> + Send;

    /// List bookings matching `filter`, newest first unless asked otherwise.
    fn list(
        &self,
        filter: BookingFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, RepositoryError>> + Send;

    /// Replace the stored record with `booking` if the stored version equals
    /// `expected_version`. Returns `Conflict` on a version mismatch and
    /// `NotFound` if the booking does not exist.
    fn update(
        &self,
        booking: &Booking,
        expected_version: u64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Number of non-terminal bookings against a provider.
    fn count_active(
        &self,
        provider_id: &ProviderId,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
