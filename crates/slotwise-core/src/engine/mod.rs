//! The slot allocation engine.
//!
//! - [`registry::ProviderRegistry`] owns provider slot counts and is the sole
//!   place they change.
//! - [`lifecycle::BookingLifecycle`] drives bookings through their status
//!   machine and turns each transition into at most one registry call.
//! - [`lock::LockTable`] provides the per-key exclusive regions both rely on.
//!
//! Lock order is always booking before provider.

pub mod lifecycle;
pub mod lock;
pub mod registry;

use slotwise_types::error::{RepositoryError, SlotError};

/// Map a storage failure into the engine's error space.
///
/// A version conflict means a writer outside this process touched the record
/// between our read and write; the caller may retry.
pub(crate) fn storage_error(resource: &str, err: RepositoryError) -> SlotError {
    match err {
        RepositoryError::Conflict(msg) => SlotError::Busy {
            resource: format!("{resource} ({msg})"),
            waited_ms: 0,
        },
        other => SlotError::Storage(other.to_string()),
    }
}
