//! synckit - shared helpers for concurrent Rust services
//!
//! The centerpiece is [`ThreadSafeMap`], a string-keyed map behind a single
//! mutex with atomic read-modify-write and list-append operations. Around it
//! sit small helpers for request-scoped logging, `.env` configuration, typed
//! JSON HTTP calls, panic-safe task groups and slice/math utilities.

pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod math;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{ListValue, RequestContext, TaskGroup, ThreadSafeMap};
pub use error::{AppError, Result};
