//! Subject (materia) models, re-exported from the models crate.

pub use cuaderno_models::SubjectId;
pub use cuaderno_models::subjects::*;
