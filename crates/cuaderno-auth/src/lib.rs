//! # Cuaderno Auth
//!
//! Authentication types and JWT utilities for the Cuaderno API.
//!
//! - [`roles`]: The three user roles and their string form
//! - [`claims`]: JWT claim structures for access and refresh tokens
//! - [`jwt`]: Token creation and verification utilities
//!
//! # Token Types
//!
//! - **Access Token** ([`Claims`]): Short-lived token carrying the user's id, email and role
//! - **Refresh Token** ([`RefreshTokenClaims`]): Long-lived token for obtaining new access tokens
//!
//! # Example
//!
//! ```ignore
//! use cuaderno_auth::{UserRole, create_access_token, verify_token};
//! use cuaderno_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//!
//! let token = create_access_token(42, "ana@example.com", UserRole::Professor, &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.role, UserRole::Professor);
//! ```

pub mod claims;
pub mod jwt;
pub mod roles;

// Re-export commonly used types at crate root
pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{create_access_token, create_refresh_token, verify_refresh_token, verify_token};
pub use roles::UserRole;
