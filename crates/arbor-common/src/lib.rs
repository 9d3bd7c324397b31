//! Arbor common types, errors, and configuration.
//!
//! This crate provides shared definitions used across all Arbor components.

pub mod config;
pub mod error;

pub use config::{TreeConfig, DEFAULT_DEGREE, MIN_DEGREE};
pub use error::{ArborError, Result};
