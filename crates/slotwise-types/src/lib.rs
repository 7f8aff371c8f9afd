//! Shared domain types for Slotwise.
//!
//! This crate contains the core domain types used across the Slotwise
//! workspace: Provider, Booking, the booking status machine, configuration,
//! and the associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod booking;
pub mod config;
pub mod error;
pub mod provider;
