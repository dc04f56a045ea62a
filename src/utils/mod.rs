//! Utility modules

pub mod string;
pub mod timeout;

pub use string::truncate_str;
pub use timeout::{with_timeout, TimeoutError};
