//! # Cuaderno Models
//!
//! Domain models and DTOs for the Cuaderno API: database rows, request and
//! response bodies, query filters and the helpers that fold flat rows into
//! nested responses.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed entity ids
//! - [`value_types`]: Validated domain primitives ([`value_types::ClassTime`])
//! - [`auth`]: Registration, login and token DTOs
//! - [`users`]: Users and profile DTOs
//! - [`subjects`]: Subjects (materias)
//! - [`commissions`]: Commissions (comisiones) and enrollment
//! - [`schedules`]: Weekly sessions (horarios) and [`schedules::group_by_weekday`]
//! - [`contents`]: Course content (contenidos) and [`contents::group_by_week`]
//! - [`evaluations`]: Evaluations (evaluaciones)
//! - [`grades`]: Grades (notas)
//! - [`notifications`]: In-app notifications

pub mod auth;
pub mod commissions;
pub mod contents;
pub mod evaluations;
pub mod grades;
pub mod ids;
pub mod notifications;
pub mod schedules;
pub mod subjects;
pub mod users;
pub mod value_types;

// Re-export commonly used types at crate root for convenience
pub use auth::{
    Claims, LoginRequest, LoginResponse, MessageResponse, RefreshTokenClaims,
    RefreshTokenRequest, RegisterRequest, TokenResponse, UserRole,
};
pub use ids::{
    CommissionId, ContentId, EvaluationId, GradeId, NotificationId, ScheduleId, SubjectId, UserId,
};
pub use value_types::ClassTime;
