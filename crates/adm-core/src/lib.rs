//! # adm-core
//!
//! Core types, traits, and utilities for Admin RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type alias
//! - Pagination types
//! - Configuration types

pub mod config;
pub mod error;
pub mod pagination;
pub mod result;

pub use error::*;
pub use pagination::*;
pub use result::*;

/// Primary key type
pub type Id = i64;
