//! # footfall-core
//!
//! Core library for footfall - visitor analytics over face-recognition
//! events.
//!
//! This library provides:
//! - Domain types for identities, recognition events, sensors, and zones
//! - A time-window cohort and ranking engine
//! - Report assembly producing dashboard-ready JSON
//! - Request parameter validation
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Store (external):** identities and events, fetched by the caller
//! - **Engine:** pure transforms over in-memory collections ([`analytics`])
//! - **Reports:** serializable outputs built on the engine ([`reports`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use footfall_core::params::AttendanceRequest;
//! use footfall_core::reports::customer_attendance_report;
//! use footfall_core::Config;
//! use std::collections::HashMap;
//!
//! let config = Config::load().expect("failed to load config");
//! let raw = serde_json::json!({
//!     "param_startTime": "2025-02-17T00:00:00Z",
//!     "param_dueTime": "2025-02-24T00:00:00Z",
//!     "param_groupIds": "CG-1,CG-2",
//! });
//! let request = AttendanceRequest::from_params(raw.as_object().unwrap(), &config.reports)
//!     .expect("invalid request");
//!
//! let report = customer_attendance_report(
//!     request.range,
//!     request.granularity,
//!     &[],
//!     &HashMap::new(),
//!     chrono::Utc::now(),
//! );
//! println!("{}", serde_json::to_string_pretty(&report).unwrap());
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod params;
pub mod reports;
pub mod types;
