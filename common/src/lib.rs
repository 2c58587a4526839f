// Common types and utilities shared across groundlink crates

pub mod backoff;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use backoff::BackoffSchedule;
pub use config::LinkConfig;
pub use error::{GroundLinkError, Result};
pub use metrics::LinkMetrics;
pub use types::*;
