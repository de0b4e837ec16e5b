//! Authentication and authorization for request handlers.
//!
//! - [`auth`]: the [`auth::AuthUser`] extractor (bearer token to claims)
//! - [`role`]: role guards as route layers and as extractors
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//! use crate::middleware::role::RequireTeacher;
//!
//! // Any authenticated user
//! async fn get_profile(auth_user: AuthUser) -> impl IntoResponse {
//!     let user_id = auth_user.user_id()?;
//!     // ...
//! }
//!
//! // Professors and admins only
//! async fn create_content(RequireTeacher(auth_user): RequireTeacher) -> impl IntoResponse {
//!     // ...
//! }
//! ```

pub mod auth;
pub mod role;
