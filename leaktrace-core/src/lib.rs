//! Core library for leaktrace: heap-snapshot analysis tasks and the
//! retention-chain query service on top of `leaktrace-snapshot`.

pub mod analyze;
pub mod config;
pub mod error;
pub mod tasks;
pub mod translate;

pub use config::LeaktraceConfig;
pub use error::{LeaktraceError, Result};
pub use tasks::{TaskId, TaskRegistry};
