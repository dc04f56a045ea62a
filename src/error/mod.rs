//! Error types
//!
//! HTTP-facing errors returned by gateway handlers.

pub mod types;

pub use types::ApiError;
