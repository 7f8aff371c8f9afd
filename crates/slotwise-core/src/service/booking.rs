//! Booking service.
//!
//! The inbound facade used by the REST and CLI layers. Validates and
//! normalizes client requests, then hands them to the lifecycle manager,
//! which owns all slot accounting.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use slotwise_types::booking::{
    Booking, BookingDetails, BookingId, BookingStatus, CreateBookingRequest, SlotStats,
};
use slotwise_types::error::SlotError;
use slotwise_types::provider::{Provider, ProviderId, ProviderView};
use tracing::{info, warn};

use crate::engine::lifecycle::{BookingLifecycle, ExpirySweep};
use crate::repository::booking::{BookingFilter, BookingRepository};
use crate::repository::provider::ProviderRepository;

/// Service orchestrating booking use cases on top of the engine.
///
/// Generic over repository traits to maintain clean architecture --
/// slotwise-core never depends on slotwise-infra.
pub struct BookingService<P: ProviderRepository, B: BookingRepository> {
    lifecycle: BookingLifecycle<P, B>,
    pending_ttl: Option<Duration>,
}

impl<P: ProviderRepository, B: BookingRepository> BookingService<P, B> {
    /// Create a new BookingService.
    ///
    /// - `lifecycle`: the engine that owns slot accounting
    /// - `pending_ttl`: age after which Pending bookings are cancelled by
    ///   [`Self::expire_stale_pending`]; `None` disables expiry
    pub fn new(lifecycle: BookingLifecycle<P, B>, pending_ttl: Option<Duration>) -> Self {
        Self {
            lifecycle,
            pending_ttl,
        }
    }

    pub fn lifecycle(&self) -> &BookingLifecycle<P, B> {
        &self.lifecycle
    }

    pub fn pending_ttl(&self) -> Option<Duration> {
        self.pending_ttl
    }

    /// Create a booking against a provider.
    ///
    /// 1. Trims and validates the client and vehicle fields
    /// 2. Upper-cases the licence plate and engine number
    /// 3. Rejects appointment dates before today
    /// 4. Rejects a second active booking for the same phone on the same date
    /// 5. Reserves the slot and stores the booking
    pub async fn create_booking(&self, request: CreateBookingRequest) -> Result<Booking, SlotError> {
        let provider_id = request.provider_id;
        let details = normalize(request)?;

        let today = Utc::now().date_naive();
        if details.appointment_date < today {
            return Err(SlotError::Validation(format!(
                "appointment date {} is in the past",
                details.appointment_date
            )));
        }

        // Best-effort: two identical requests racing past this check can both
        // be accepted. Slot accounting stays exact either way.
        if let Some(existing) = self
            .find_active(&details.client_phone, details.appointment_date)
            .await?
        {
            return Err(SlotError::DuplicateBooking {
                date: details.appointment_date,
                existing: existing.id,
            });
        }

        let booking = self.lifecycle.create(&provider_id, details).await?;
        info!(booking_id = %booking.id, provider_id = %booking.provider_id, date = %booking.details.appointment_date, "booking accepted");
        Ok(booking)
    }

    async fn find_active(
        &self,
        phone: &str,
        date: NaiveDate,
    ) -> Result<Option<Booking>, SlotError> {
        let matches = self
            .lifecycle
            .list(BookingFilter {
                statuses: BookingStatus::ACTIVE.to_vec(),
                client_phone: Some(phone.to_string()),
                appointment_date: Some(date),
                limit: Some(1),
                ..Default::default()
            })
            .await?;
        Ok(matches.into_iter().next())
    }

    /// Move a booking to `status`.
    pub async fn transition_booking(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, SlotError> {
        self.lifecycle.transition(id, status).await
    }

    /// Move an active booking to another date. Past dates are rejected.
    pub async fn reschedule_booking(
        &self,
        id: &BookingId,
        date: NaiveDate,
    ) -> Result<Booking, SlotError> {
        if date < Utc::now().date_naive() {
            return Err(SlotError::Validation(format!(
                "appointment date {date} is in the past"
            )));
        }
        self.lifecycle.reschedule(id, date).await
    }

    pub async fn get_booking(&self, id: &BookingId) -> Result<Booking, SlotError> {
        self.lifecycle.get(id).await
    }

    pub async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<Booking>, SlotError> {
        self.lifecycle.list(filter).await
    }

    pub async fn get_provider(&self, id: &ProviderId) -> Result<ProviderView, SlotError> {
        self.lifecycle.registry().get(id).await.map(ProviderView::from)
    }

    /// All providers ordered by name, with their display values.
    pub async fn list_providers(&self) -> Result<Vec<ProviderView>, SlotError> {
        let providers = self.lifecycle.registry().list().await?;
        Ok(providers.into_iter().map(ProviderView::from).collect())
    }

    pub async fn set_capacity(
        &self,
        id: &ProviderId,
        total_slots: u32,
    ) -> Result<Provider, SlotError> {
        let provider = self.lifecycle.set_capacity(id, total_slots).await?;
        info!(provider_id = %id, slots = %provider.slot_text(), "provider capacity changed");
        Ok(provider)
    }

    /// Provider capacity totals and booking counts per status.
    pub async fn stats(&self) -> Result<SlotStats, SlotError> {
        let mut stats = SlotStats::default();
        for provider in self.lifecycle.registry().list().await? {
            stats.providers += 1;
            stats.total_slots += provider.total_slots;
            stats.available_slots += provider.available_slots;
            stats.booked_slots += provider.booked_slots();
        }
        for booking in self.lifecycle.list(BookingFilter::default()).await? {
            stats.record(booking.status);
        }
        Ok(stats)
    }

    /// Cancel Pending bookings older than the configured TTL. Returns an
    /// empty sweep when no TTL is configured.
    pub async fn expire_stale_pending(&self, now: DateTime<Utc>) -> Result<ExpirySweep, SlotError> {
        let Some(ttl) = self.pending_ttl else {
            return Ok(ExpirySweep::default());
        };
        let sweep = self.lifecycle.expire_pending(ttl, now).await?;
        if !sweep.cancelled.is_empty() {
            info!(count = sweep.cancelled.len(), "expired stale pending bookings");
        }
        if sweep.busy + sweep.failed > 0 {
            warn!(
                busy = sweep.busy,
                failed = sweep.failed,
                "some stale pending bookings were left for the next sweep"
            );
        }
        Ok(sweep)
    }
}

/// Trim and validate the request's free-text fields.
fn normalize(request: CreateBookingRequest) -> Result<BookingDetails, SlotError> {
    fn required(field: &str, value: String) -> Result<String, SlotError> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(SlotError::Validation(format!("{field} is required")));
        }
        Ok(value)
    }

    let client_phone = required("client phone", request.client_phone)?;
    if !client_phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(SlotError::Validation(format!(
            "client phone '{client_phone}' contains invalid characters"
        )));
    }

    Ok(BookingDetails {
        client_name: required("client name", request.client_name)?,
        client_phone,
        client_address: required("client address", request.client_address)?,
        car_license: required("car license", request.car_license)?.to_uppercase(),
        car_engine: required("car engine", request.car_engine)?.to_uppercase(),
        appointment_date: request.appointment_date,
        notes: request.notes.map(|n| n.trim().to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::ProviderRegistry;
    use crate::test_support::{MemoryBookings, MemoryProviders, new_provider};

    type Service = BookingService<MemoryProviders, MemoryBookings>;

    fn service(ttl: Option<Duration>) -> Service {
        let timeout = Duration::from_millis(200);
        BookingService::new(
            BookingLifecycle::new(
                ProviderRegistry::new(MemoryProviders::default(), timeout),
                MemoryBookings::default(),
                timeout,
            ),
            ttl,
        )
    }

    fn future_date() -> NaiveDate {
        Utc::now().date_naive() + chrono::Duration::days(7)
    }

    fn request(provider_id: ProviderId, phone: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            provider_id,
            client_name: "  Maria Santos ".into(),
            client_phone: phone.into(),
            client_address: "4 Quay St".into(),
            car_license: "abc-1234".into(),
            car_engine: "ej20x".into(),
            appointment_date: future_date(),
            notes: None,
        }
    }

    async fn provider(svc: &Service, total: u32, available: u32) -> Provider {
        svc.lifecycle()
            .registry()
            .register(new_provider("Mike Johnson", total, available))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_booking_normalizes_fields() {
        let svc = service(None);
        let p = provider(&svc, 4, 4).await;
        let booking = svc.create_booking(request(p.id, "555-0100")).await.unwrap();
        assert_eq!(booking.details.client_name, "Maria Santos");
        assert_eq!(booking.details.car_license, "ABC-1234");
        assert_eq!(booking.details.car_engine, "EJ20X");
        assert_eq!(booking.details.notes, "");
        assert_eq!(svc.get_provider(&p.id).await.unwrap().provider.available_slots, 3);
    }

    #[tokio::test]
    async fn create_booking_rejects_blank_fields() {
        let svc = service(None);
        let p = provider(&svc, 4, 4).await;
        let mut req = request(p.id, "555-0101");
        req.client_address = "   ".into();
        let err = svc.create_booking(req).await.unwrap_err();
        assert!(matches!(err, SlotError::Validation(msg) if msg.contains("address")));

        let err = svc.create_booking(request(p.id, "call me")).await.unwrap_err();
        assert!(matches!(err, SlotError::Validation(_)));
        assert_eq!(svc.get_provider(&p.id).await.unwrap().provider.available_slots, 4);
    }

    #[tokio::test]
    async fn create_booking_rejects_past_dates() {
        let svc = service(None);
        let p = provider(&svc, 4, 4).await;
        let mut req = request(p.id, "555-0102");
        req.appointment_date = Utc::now().date_naive() - chrono::Duration::days(1);
        let err = svc.create_booking(req).await.unwrap_err();
        assert!(matches!(err, SlotError::Validation(msg) if msg.contains("past")));
    }

    #[tokio::test]
    async fn duplicate_booking_same_phone_same_date() {
        let svc = service(None);
        let p = provider(&svc, 4, 4).await;
        let first = svc.create_booking(request(p.id, "555-0103")).await.unwrap();
        let err = svc.create_booking(request(p.id, "555-0103")).await.unwrap_err();
        assert!(matches!(err, SlotError::DuplicateBooking { existing, .. } if existing == first.id));

        // Once the first booking is finished the client may book again.
        svc.transition_booking(&first.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        svc.create_booking(request(p.id, "555-0103")).await.unwrap();
    }

    #[tokio::test]
    async fn list_providers_carries_display_values() {
        let svc = service(None);
        provider(&svc, 4, 3).await;
        let views = svc.list_providers().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].slot_text, "3/4 slots available");
        assert_eq!(views[0].booked_slots, 1);
        assert!(views[0].is_available);
    }

    #[tokio::test]
    async fn stats_count_slots_and_statuses() {
        let svc = service(None);
        let p = provider(&svc, 4, 3).await;
        let a = svc.create_booking(request(p.id, "555-0104")).await.unwrap();
        let b = svc.create_booking(request(p.id, "555-0105")).await.unwrap();
        svc.create_booking(request(p.id, "555-0106")).await.unwrap();
        svc.transition_booking(&a.id, BookingStatus::Completed).await.unwrap();
        svc.transition_booking(&b.id, BookingStatus::Confirmed).await.unwrap();

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.providers, 1);
        assert_eq!(stats.total_slots, 4);
        assert_eq!(stats.available_slots, 1);
        assert_eq!(stats.booked_slots, 3);
        assert_eq!((stats.pending, stats.confirmed, stats.completed), (1, 1, 1));
    }

    #[tokio::test]
    async fn reschedule_rejects_past_dates() {
        let svc = service(None);
        let p = provider(&svc, 4, 4).await;
        let b = svc.create_booking(request(p.id, "555-0107")).await.unwrap();
        let err = svc
            .reschedule_booking(&b.id, Utc::now().date_naive() - chrono::Duration::days(3))
            .await
            .unwrap_err();
        assert!(matches!(err, SlotError::Validation(_)));

        let later = future_date() + chrono::Duration::days(1);
        let moved = svc.reschedule_booking(&b.id, later).await.unwrap();
        assert_eq!(moved.details.appointment_date, later);
    }

    #[tokio::test]
    async fn expiry_is_disabled_without_ttl() {
        let svc = service(None);
        let p = provider(&svc, 4, 4).await;
        svc.create_booking(request(p.id, "555-0108")).await.unwrap();
        let far_future = Utc::now() + chrono::Duration::days(30);
        assert!(svc.expire_stale_pending(far_future).await.unwrap().cancelled.is_empty());
        assert_eq!(svc.get_provider(&p.id).await.unwrap().provider.available_slots, 3);
    }

    #[tokio::test]
    async fn expiry_cancels_old_pending_bookings() {
        let svc = service(Some(Duration::from_secs(600)));
        let p = provider(&svc, 4, 4).await;
        let b = svc.create_booking(request(p.id, "555-0109")).await.unwrap();

        assert!(svc.expire_stale_pending(Utc::now()).await.unwrap().cancelled.is_empty());

        let later = Utc::now() + chrono::Duration::minutes(11);
        let sweep = svc.expire_stale_pending(later).await.unwrap();
        assert_eq!(sweep.cancelled.len(), 1);
        assert_eq!(svc.get_booking(&b.id).await.unwrap().status, BookingStatus::Cancelled);
        assert_eq!(svc.get_provider(&p.id).await.unwrap().provider.available_slots, 4);
    }

    #[tokio::test]
    async fn exhausted_provider_surfaces_through_service() {
        let svc = service(None);
        let p = provider(&svc, 4, 0).await;
        let err = svc.create_booking(request(p.id, "555-0110")).await.unwrap_err();
        assert!(matches!(err, SlotError::SlotsExhausted { .. }));
    }
}
