//! Telemetry: structured logging for the totaling engine and its tools.
//!
//! # Example
//!
//! ```rust,no_run
//! use facts_total_core::telemetry::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default()).expect("Failed to initialize logging");
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingConfig};
