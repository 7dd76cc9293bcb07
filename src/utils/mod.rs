//! The `utils` module provides a collection of utility functions and common
//! definitions used across the `scorecast` application.
//!
//! This module centralizes reusable components, such as the upstream error
//! types and logging initialization.

pub mod error;
pub mod logging;
