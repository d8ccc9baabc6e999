//! Domain layer
//!
//! Core models, errors, and the port traits infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
