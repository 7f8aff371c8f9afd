//! Infrastructure layer for Slotwise.
//!
//! Contains implementations of the repository traits defined in `slotwise-core`
//! (SQLite storage), plus configuration loading, data directory resolution and
//! provider seed data.

pub mod config;
pub mod filesystem;
pub mod seed;
pub mod sqlite;
