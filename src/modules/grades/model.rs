//! Grades (notas), re-exported from the models crate.

pub use cuaderno_models::grades::*;
pub use cuaderno_models::{EvaluationId, GradeId, SubjectId, UserId};
