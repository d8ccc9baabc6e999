//! HTTP adapters for the external judge service.
//!
//! - `client`: scores phrases against the judge endpoint
//! - `webhook`: posts verdict events to a callback URL

pub mod client;
pub mod webhook;

pub use client::{HttpJudgeClient, JudgeClientConfig};
pub use webhook::WebhookVerdictSink;
