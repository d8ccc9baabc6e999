//! Application layer: wiring services into a runnable instance.

pub mod app;

pub use app::App;
