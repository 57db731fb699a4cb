//! Core building blocks: the thread-safe map plus the request context,
//! logging and task helpers that surround it.

// Concurrent containers
pub mod concurrency;

// Request-scoped context and log correlation
pub mod context;
pub mod logging;

// Concurrent task execution
pub mod task_group;

pub use concurrency::{ListValue, ThreadSafeMap};
pub use context::RequestContext;
pub use task_group::TaskGroup;
