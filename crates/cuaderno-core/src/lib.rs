//! # Cuaderno Core
//!
//! Core types, errors, and utilities for the Cuaderno API.
//!
//! This crate provides foundational types used throughout the Cuaderno application:
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`pagination`]: Pagination utilities for API responses
//! - [`password`]: Password hashing and verification
//! - [`search`]: Escaped `LIKE` patterns for free-text filters
//! - [`serde`]: Custom serde deserialization helpers for query strings
//!
//! # Example
//!
//! ```ignore
//! use cuaderno_core::errors::AppError;
//! use cuaderno_core::pagination::{PaginationParams, PaginationMeta};
//! use cuaderno_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Subject not found"));
//!
//! let hash = hash_password("secure_password")?;
//!
//! let params = PaginationParams::default();
//! let limit = params.limit();
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod search;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
