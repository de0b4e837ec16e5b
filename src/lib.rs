//! # Cuaderno API
//!
//! A REST API built with Rust, Axum, and SQLite for organizing the academic
//! life of a study plan: subjects, their commissions, weekly class
//! schedules, published contents, evaluations and grades.
//!
//! ## Overview
//!
//! - **Authentication**: JWT access and refresh tokens, self-registration as student
//! - **Roles**: admin, professor and student, checked by extractors and route layers
//! - **Academic model**: subjects → commissions → enrolled students
//! - **Schedules**: weekly sessions with professor, commission and classroom conflict detection
//! - **Contents**: material published per subject, grouped by week number
//! - **Evaluations and grades**: batch grading with per-subject averages for students
//! - **Notifications**: fan-out over an in-memory or Redis broker, persisted by a worker
//!   and optionally emailed
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── bin/cli.rs        # Admin CLI (create-admin, seed, clear-seed)
//! ├── cli/              # CLI command implementations and the seeder
//! ├── messaging/        # Broker, publisher and notification worker
//! ├── middleware/       # Auth extractor and role guards
//! ├── modules/          # Feature modules
//! │   ├── auth/         # Register, login, refresh
//! │   ├── users/        # Profile and admin user management
//! │   ├── subjects/     # Subjects
//! │   ├── commissions/  # Commissions and enrollment
//! │   ├── schedules/    # Weekly class sessions
//! │   ├── contents/     # Course content
//! │   ├── evaluations/  # Evaluations
//! │   ├── grades/       # Grades and summaries
//! │   └── notifications/# In-app notifications
//! └── utils/            # Email delivery
//! ```
//!
//! Each feature module follows the same layout:
//!
//! - `controller.rs`: HTTP handlers with OpenAPI annotations
//! - `service.rs`: Business logic and SQL
//! - `model.rs`: Re-exports from `cuaderno-models`
//! - `router.rs`: Axum router configuration
//!
//! ## Roles
//!
//! | Role | Can do |
//! |------|--------|
//! | Admin | Everything, including users, subjects and commissions |
//! | Professor | Schedules, contents, evaluations and grades |
//! | Student | Read the catalog, own schedule, own grades and notifications |
//!
//! Admins are created through the CLI; public registration always yields a student.
//!
//! ## Quick Start
//!
//! ```bash
//! DATABASE_URL=sqlite://storage/cuaderno.db?mode=rwc
//! JWT_SECRET=your-secure-secret-key
//! NOTIFICATIONS_BROKER=memory
//! ```
//!
//! ```bash
//! cargo run --bin cuaderno-cli -- create-admin
//! cargo run --bin cuaderno
//! ```
//!
//! API documentation is served at `/swagger-ui` and `/scalar`.
//!
//! ## Modules
//!
//! - [`cli`]: Admin creation and demo data seeding
//! - [`docs`]: OpenAPI documentation setup
//! - [`logging`]: Tracing setup and request logging
//! - [`messaging`]: Notification fan-out
//! - [`metrics`]: Prometheus metrics
//! - [`middleware`]: Authentication and authorization
//! - [`modules`]: Feature modules
//! - [`router`]: Main application router
//! - [`state`]: Shared application state
//! - [`utils`]: Email delivery
//! - [`validator`]: Request validation

pub mod cli;
pub mod docs;
pub mod logging;
pub mod messaging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

// Re-export workspace crates for convenience
pub use cuaderno_auth;
pub use cuaderno_config;
pub use cuaderno_core;
pub use cuaderno_db;
pub use cuaderno_models;
