// src/errors/mod.rs
//! Structured error reporting for the Marten graph core.
//!
//! Error code ranges follow the compiler-wide numbering scheme; this crate
//! owns E7xxx (plugin registration and dispatch faults).

pub mod registration;

pub use registration::{RegistrationError, RegistrationResult};
