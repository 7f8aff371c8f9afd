use chrono::NaiveDate;
use thiserror::Error;

use crate::booking::{BookingId, BookingStatus};
use crate::provider::ProviderId;

/// Errors returned by the slot engine and booking service.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("provider {0} not found")]
    ProviderNotFound(ProviderId),

    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    #[error("provider {provider_id} is fully booked ({total_slots} of {total_slots} slots taken)")]
    SlotsExhausted {
        provider_id: ProviderId,
        total_slots: u32,
    },

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking is already {status}")]
    AlreadyTerminal { status: BookingStatus },

    /// A release was attempted on a provider already at full capacity. Always
    /// an accounting defect in the caller.
    #[error("slot integrity violation: provider {provider_id} already has all {total_slots} slots available")]
    CapacityExceeded {
        provider_id: ProviderId,
        total_slots: u32,
    },

    #[error("cannot resize to {requested} slots: {active} active bookings hold slots")]
    CapacityBelowActive { requested: u32, active: u32 },

    #[error("{resource} is busy (waited {waited_ms} ms)")]
    Busy { resource: String, waited_ms: u64 },

    #[error("client already has an active booking on {date}")]
    DuplicateBooking {
        date: NaiveDate,
        existing: BookingId,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl SlotError {
    /// Whether this error signals an accounting defect rather than a normal
    /// rejection.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, SlotError::CapacityExceeded { .. })
    }
}

/// Errors from repository operations (used by trait definitions in slotwise-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    /// Compare-and-swap failed, or a unique key already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}
