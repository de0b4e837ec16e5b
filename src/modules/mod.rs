pub mod auth;
pub mod commissions;
pub mod contents;
pub mod evaluations;
pub mod grades;
pub mod notifications;
pub mod schedules;
pub mod subjects;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::users::model::User;
