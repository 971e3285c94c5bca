//! Safety incident manager
//!
//! Records incidents raised by a camera-based detection pipeline and serves
//! filtered listings, category statistics and calendar time series over HTTP.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod query;
pub mod state;

pub use error::{AppError, Result};
