//! Weekly class sessions (horarios), re-exported from the models crate.

pub use cuaderno_models::schedules::*;
pub use cuaderno_models::{ClassTime, CommissionId, ScheduleId, SubjectId, UserId};
