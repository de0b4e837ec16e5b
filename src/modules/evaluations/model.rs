//! Evaluations (evaluaciones), re-exported from the models crate.

pub use cuaderno_models::evaluations::*;
pub use cuaderno_models::{CommissionId, EvaluationId, SubjectId};
