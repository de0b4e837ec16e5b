//! User management: the caller's profile plus admin CRUD over accounts.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::{init_profile_router, init_users_router};
