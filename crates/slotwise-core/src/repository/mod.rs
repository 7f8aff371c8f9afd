//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (slotwise-infra) implements. The only capability the engine relies on for
//! correctness is compare-and-swap on a single record (`update` with an
//! expected version); listings and counts serve display and validation.

pub mod booking;
pub mod provider;

/// Sort order for list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}
