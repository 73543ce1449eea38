//! Board game night status service.
//!
//! Reports whether the weekly board game night (Tuesdays, 18:45 local time)
//! is upcoming, underway or cancelled, and lets an authorized caller flip the
//! cancellation flag.
//!
//! ```text
//! GET  /               status page (text/plain)
//! POST /update/status  {"cancelled": bool}, requires Authorization
//! POST /update         toggle, requires Authorization
//! GET  /health         "OK"
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`schedule`]: Next occurrence computation and timezones
//! - [`status`]: Status evaluation and rendering
//! - [`flag`]: Shared cancellation flag
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod flag;
pub mod metrics;
pub mod schedule;
pub mod status;
pub mod utils;

pub use config::Config;
pub use error::{Result, ServiceError};
