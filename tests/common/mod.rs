//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Temporary SQLite stores
//! - Change and transaction builders
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod database;
pub mod fixtures;

// Re-export commonly used utilities
pub use database::*;
pub use fixtures::*;
