//! Hanzo Console gateway library
//!
//! Reverse proxy that scopes every forwarded request to the caller's
//! organization and project.

// Public modules
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod proxy;
pub mod server;
pub mod tenant;
pub mod utils;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;
