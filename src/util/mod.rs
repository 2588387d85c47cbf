//! Utility functions and helpers
//!
//! This module provides various utility functions used throughout the library.
//!
//! ## Modules
//!
//! - [`retry`] - Retry logic for resilient operations

pub mod retry;
