//! Booking lifecycle manager.
//!
//! Drives a booking through its status machine and turns each transition
//! into at most one registry call:
//!
//! - creation reserves a slot (`Pending` already holds one);
//! - entering `Completed` or `Cancelled` releases it;
//! - every other legal edge leaves the count untouched.
//!
//! A terminal transition holds the booking region and then the provider
//! region while it releases the slot and persists the new status. If the
//! status write fails, the release is undone before the error is returned, so
//! a booking is never terminal without its release and vice versa.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use slotwise_types::booking::{Booking, BookingDetails, BookingId, BookingStatus, SlotHold};
use slotwise_types::error::{RepositoryError, SlotError};
use slotwise_types::provider::{Provider, ProviderId};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, warn};

use super::lock::LockTable;
use super::registry::ProviderRegistry;
use super::storage_error;
use crate::repository::booking::{BookingFilter, BookingRepository};
use crate::repository::provider::ProviderRepository;

/// Check that `from -> to` is a legal edge.
///
/// Leaving a terminal status fails with `AlreadyTerminal` when the target is
/// terminal too (a retry, or a lost race between two finishers) and with
/// `InvalidTransition` otherwise.
pub fn check_transition(from: BookingStatus, to: BookingStatus) -> Result<(), SlotError> {
    if from.is_terminal() {
        return Err(if to.is_terminal() {
            SlotError::AlreadyTerminal { status: from }
        } else {
            SlotError::InvalidTransition { from, to }
        });
    }
    if !from.can_transition_to(to) {
        return Err(SlotError::InvalidTransition { from, to });
    }
    Ok(())
}

/// Outcome of one [`BookingLifecycle::expire_pending`] pass.
#[derive(Debug, Default)]
pub struct ExpirySweep {
    /// Bookings moved to `Cancelled`.
    pub cancelled: Vec<Booking>,
    /// Stale bookings that were no longer `Pending` when their turn came.
    pub skipped: usize,
    /// Bookings whose region could not be entered in time.
    pub busy: usize,
    pub failed: usize,
}

/// Issues, transitions and retires bookings against provider slot counts.
pub struct BookingLifecycle<P: ProviderRepository, B: BookingRepository> {
    registry: ProviderRegistry<P>,
    bookings: B,
    locks: LockTable<BookingId>,
}

impl<P: ProviderRepository, B: BookingRepository> BookingLifecycle<P, B> {
    /// Create a lifecycle manager. Booking lock waits are bounded by
    /// `lock_timeout`; provider waits by the registry's own timeout.
    pub fn new(registry: ProviderRegistry<P>, bookings: B, lock_timeout: Duration) -> Self {
        Self {
            registry,
            bookings,
            locks: LockTable::new("booking", lock_timeout),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry<P> {
        &self.registry
    }

    pub fn bookings(&self) -> &B {
        &self.bookings
    }

    /// Snapshot of a booking.
    pub async fn get(&self, id: &BookingId) -> Result<Booking, SlotError> {
        self.bookings
            .get(id)
            .await
            .map_err(|e| SlotError::Storage(e.to_string()))?
            .ok_or(SlotError::BookingNotFound(*id))
    }

    /// Bookings matching `filter`.
    pub async fn list(&self, filter: BookingFilter) -> Result<Vec<Booking>, SlotError> {
        self.bookings
            .list(filter)
            .await
            .map_err(|e| SlotError::Storage(e.to_string()))
    }

    /// Create a `Pending` booking against `provider_id`, consuming one slot.
    pub async fn create(
        &self,
        provider_id: &ProviderId,
        details: BookingDetails,
    ) -> Result<Booking, SlotError> {
        let provider = self.registry.lock(provider_id).await?;
        provider.try_reserve().await?;

        let booking = Booking::pending(*provider_id, details, Utc::now());
        if let Err(err) = self.bookings.insert(&booking).await {
            warn!(%provider_id, error = %err, "booking insert failed, returning reserved slot");
            if let Err(undo) = provider.release().await {
                error!(%provider_id, error = %undo, "could not return slot after failed booking insert");
                return Err(undo);
            }
            return Err(storage_error("booking", err));
        }

        debug!(booking_id = %booking.id, %provider_id, "booking created");
        Ok(booking)
    }

    /// Move a booking to `next`, applying the slot adjustment exactly once.
    pub async fn transition(
        &self,
        id: &BookingId,
        next: BookingStatus,
    ) -> Result<Booking, SlotError> {
        let guard = self.locks.acquire(id).await?;
        let result = match self.get(id).await {
            Ok(current) => self.transition_locked(current, next).await,
            Err(err) => Err(err),
        };
        self.unlock(id, guard);
        result
    }

    /// Move a booking to `next` only if it is still in `expected` once the
    /// booking region is held. Returns `None` when the status had already
    /// moved on.
    pub async fn transition_if(
        &self,
        id: &BookingId,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<Option<Booking>, SlotError> {
        let guard = self.locks.acquire(id).await?;
        let result = match self.get(id).await {
            Ok(current) if current.status != expected => {
                debug!(booking_id = %id, %expected, found = %current.status, "status moved on, skipping");
                Ok(None)
            }
            Ok(current) => self.transition_locked(current, next).await.map(Some),
            Err(err) => Err(err),
        };
        self.unlock(id, guard);
        result
    }

    async fn transition_locked(
        &self,
        current: Booking,
        next: BookingStatus,
    ) -> Result<Booking, SlotError> {
        let id = current.id;
        check_transition(current.status, next)?;
        let updated = current.with_status(next, Utc::now());

        if !next.is_terminal() {
            self.write(&updated, current.version).await?;
            debug!(booking_id = %id, from = %current.status, to = %next, "booking transitioned");
            return Ok(updated);
        }

        let provider = self.registry.lock(&current.provider_id).await?;
        let holds_slot = current.slot == SlotHold::Held;
        if holds_slot {
            provider.release().await?;
        }

        if let Err(err) = self.write(&updated, current.version).await {
            if holds_slot {
                warn!(booking_id = %id, error = %err, "status write failed, taking the released slot back");
                if let Err(undo) = provider.try_reserve().await {
                    error!(booking_id = %id, error = %undo, "could not restore slot after failed status write");
                    return Err(undo);
                }
            }
            return Err(err);
        }

        debug!(
            booking_id = %id,
            provider_id = %current.provider_id,
            from = %current.status,
            to = %next,
            "booking finished, slot released"
        );
        Ok(updated)
    }

    /// Move a non-terminal booking to another appointment date. The provider
    /// is fixed for the booking's lifetime.
    pub async fn reschedule(
        &self,
        id: &BookingId,
        date: NaiveDate,
    ) -> Result<Booking, SlotError> {
        let guard = self.locks.acquire(id).await?;
        let result = self.reschedule_locked(id, date).await;
        self.unlock(id, guard);
        result
    }

    async fn reschedule_locked(&self, id: &BookingId, date: NaiveDate) -> Result<Booking, SlotError> {
        let current = self.get(id).await?;
        if current.status.is_terminal() {
            return Err(SlotError::AlreadyTerminal {
                status: current.status,
            });
        }

        let mut updated = current.clone();
        updated.details.appointment_date = date;
        updated.version = current.version + 1;
        updated.updated_at = Utc::now();
        self.write(&updated, current.version).await?;
        Ok(updated)
    }

    /// Leave the booking region and drop its table entry unless another
    /// caller is holding or waiting on it. Entries therefore live only as
    /// long as there is contention, whatever the outcome.
    fn unlock(&self, id: &BookingId, guard: OwnedMutexGuard<()>) {
        drop(guard);
        self.locks.prune(id);
    }

    /// Administrative resize of a provider's daily capacity. Rejects values
    /// below the number of active bookings.
    pub async fn set_capacity(
        &self,
        provider_id: &ProviderId,
        total_slots: u32,
    ) -> Result<Provider, SlotError> {
        let provider = self.registry.lock(provider_id).await?;
        // Creation and terminal transitions both hold this region while
        // writing, so the count cannot move under us.
        let active = self
            .bookings
            .count_active(provider_id)
            .await
            .map_err(|e| SlotError::Storage(e.to_string()))?;
        provider.set_capacity(total_slots, active).await
    }

    /// Cancel every `Pending` booking created more than `ttl` before `now`.
    ///
    /// Each cancellation re-checks the status under the booking region, so a
    /// booking confirmed after the listing is left alone. A booking whose
    /// region stays busy, or whose cancellation fails, is counted and the
    /// sweep moves on; the next pass picks it up again.
    pub async fn expire_pending(
        &self,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<ExpirySweep, SlotError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| SlotError::Validation(format!("pending ttl out of range: {e}")))?;
        let stale = self
            .list(BookingFilter {
                statuses: vec![BookingStatus::Pending],
                created_before: Some(now - ttl),
                ..Default::default()
            })
            .await?;

        let mut sweep = ExpirySweep::default();
        for booking in stale {
            match self
                .transition_if(&booking.id, BookingStatus::Pending, BookingStatus::Cancelled)
                .await
            {
                Ok(Some(done)) => sweep.cancelled.push(done),
                Ok(None) | Err(SlotError::BookingNotFound(_)) => sweep.skipped += 1,
                Err(SlotError::Busy { .. }) => {
                    debug!(booking_id = %booking.id, "booking busy, leaving it for the next sweep");
                    sweep.busy += 1;
                }
                Err(err) => {
                    error!(booking_id = %booking.id, error = %err, "could not expire pending booking");
                    sweep.failed += 1;
                }
            }
        }
        Ok(sweep)
    }

    async fn write(&self, booking: &Booking, expected_version: u64) -> Result<(), SlotError> {
        self.bookings
            .update(booking, expected_version)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => SlotError::BookingNotFound(booking.id),
                other => storage_error(&format!("booking {}", booking.id), other),
            })
    }
}
