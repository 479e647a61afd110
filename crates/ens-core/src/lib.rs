//! ens-core: Shared configuration and clock utilities for ensemble
//!
//! This crate provides the configuration structures, error types, and
//! wall-clock helpers used by both the relay daemon and the player
//! client.

pub mod config;
pub mod error;
pub mod time;

pub use error::ConfigError;
pub use time::{Clock, SystemClock};
