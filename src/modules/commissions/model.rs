//! Commission (comisión) and enrollment models, re-exported from the models crate.

pub use cuaderno_models::commissions::*;
pub use cuaderno_models::{CommissionId, SubjectId, UserId};
