//! Slot allocation engine and repository trait definitions for Slotwise.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, and the engine that keeps provider slot counts
//! consistent under concurrent booking traffic. It depends only on
//! `slotwise-types` -- never on `slotwise-infra` or any database/IO crate.

pub mod engine;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;
