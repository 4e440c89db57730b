//! Metrics collection and export for yuta.
//!
//! This crate provides a unified metrics interface using the `metrics` crate facade.
//! When the `prometheus` feature is enabled, metrics are exported in Prometheus format.
//!
//! # Usage
//!
//! ```rust,ignore
//! use yuta_metrics::{counter, labels, relay};
//!
//! counter!(relay::EVENTS_RECEIVED_TOTAL, labels::ACCOUNT_ID => "bot@matrix.org").increment(1);
//! ```
//!
//! # Features
//!
//! - `prometheus`: Enable Prometheus metrics export via the `/metrics` endpoint

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
