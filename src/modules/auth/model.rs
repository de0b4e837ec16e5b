//! Registration, login and token DTOs.

pub use cuaderno_models::auth::*;
