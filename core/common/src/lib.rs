//! Common utilities and types shared across the Hideaway crates.
//!
//! This module provides the single error type every core operation returns
//! and the zeroizing byte wrapper used for secrets held across calls.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::SensitiveBytes;
