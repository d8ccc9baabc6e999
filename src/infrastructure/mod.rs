//! Infrastructure layer module
//!
//! External integrations that are not storage adapters:
//! - Judge HTTP client and webhook verdict delivery
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod judge;
pub mod logging;
