//! User data models and DTOs.
//!
//! Re-exports the user models from the `cuaderno-models` crate.

pub use cuaderno_models::users::*;
pub use cuaderno_models::{UserId, UserRole};
