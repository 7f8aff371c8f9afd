//! Business logic services (use cases).
//!
//! Services validate inbound requests and drive the engine. They depend on
//! traits (ports) -- never on concrete infrastructure implementations.

pub mod booking;
