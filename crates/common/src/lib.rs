//! Shared error-context helpers and clock utilities used across all yuta crates.

pub mod clock;
pub mod error;

pub use error::FromMessage;
