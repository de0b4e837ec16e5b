//! Course content (contenidos), re-exported from the models crate.

pub use cuaderno_models::contents::*;
pub use cuaderno_models::{ContentId, SubjectId, UserId};
