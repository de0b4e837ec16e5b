use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use cuaderno_core::{PaginationMeta, PaginationParams};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    LoginRequest, LoginResponse, MessageResponse, RefreshTokenRequest, RegisterRequest,
    TokenResponse,
};
use crate::modules::commissions::model::{
    Commission, CreateCommissionDto, EnrollStudentsDto, EnrolledStudent, EnrollmentResponse,
    PaginatedCommissionsResponse, Shift, UpdateCommissionDto,
};
use crate::modules::contents::model::{
    Content, CreateContentDto, PaginatedContentsResponse, UpdateContentDto, WeeklyContent,
};
use crate::modules::evaluations::model::{
    CreateEvaluationDto, Evaluation, EvaluationKind, PaginatedEvaluationsResponse,
    UpdateEvaluationDto,
};
use crate::modules::grades::model::{
    Grade, GradeEntry, RecordGradesDto, RecordGradesResponse, StudentGrade, SubjectGradeSummary,
};
use crate::modules::notifications::model::{
    MarkAllReadResponse, Notification, NotificationKind, PaginatedNotificationsResponse,
    UnreadCountResponse,
};
use crate::modules::schedules::model::{
    ClassTime, CreateScheduleDto, Schedule, UpdateScheduleDto, WeekdaySchedule,
};
use crate::modules::subjects::model::{
    CreateSubjectDto, PaginatedSubjectsResponse, Subject, UpdateSubjectDto,
};
use crate::modules::users::model::{
    ChangePasswordDto, CreateUserDto, PaginatedUsersResponse, UpdateProfileDto, UpdateUserDto,
    User, UserRole,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::get_users,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::subjects::controller::create_subject,
        crate::modules::subjects::controller::get_subjects,
        crate::modules::subjects::controller::get_subject,
        crate::modules::subjects::controller::update_subject,
        crate::modules::subjects::controller::delete_subject,
        crate::modules::commissions::controller::create_commission,
        crate::modules::commissions::controller::get_commissions,
        crate::modules::commissions::controller::get_commission,
        crate::modules::commissions::controller::update_commission,
        crate::modules::commissions::controller::delete_commission,
        crate::modules::commissions::controller::get_commission_students,
        crate::modules::commissions::controller::enroll_students,
        crate::modules::commissions::controller::unenroll_student,
        crate::modules::schedules::controller::create_schedule,
        crate::modules::schedules::controller::get_schedules,
        crate::modules::schedules::controller::get_weekly_schedule,
        crate::modules::schedules::controller::get_my_schedule,
        crate::modules::schedules::controller::get_schedule,
        crate::modules::schedules::controller::update_schedule,
        crate::modules::schedules::controller::delete_schedule,
        crate::modules::contents::controller::create_content,
        crate::modules::contents::controller::get_contents,
        crate::modules::contents::controller::get_weekly_contents,
        crate::modules::contents::controller::get_content,
        crate::modules::contents::controller::update_content,
        crate::modules::contents::controller::delete_content,
        crate::modules::evaluations::controller::create_evaluation,
        crate::modules::evaluations::controller::get_evaluations,
        crate::modules::evaluations::controller::get_evaluation,
        crate::modules::evaluations::controller::update_evaluation,
        crate::modules::evaluations::controller::delete_evaluation,
        crate::modules::grades::controller::get_evaluation_grades,
        crate::modules::grades::controller::record_grades,
        crate::modules::grades::controller::delete_grade,
        crate::modules::grades::controller::get_my_grades,
        crate::modules::grades::controller::get_my_grade_summary,
        crate::modules::notifications::controller::get_notifications,
        crate::modules::notifications::controller::get_unread_count,
        crate::modules::notifications::controller::mark_read,
        crate::modules::notifications::controller::mark_all_read,
        crate::modules::notifications::controller::delete_notification,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            PaginationMeta,
            PaginationParams,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshTokenRequest,
            TokenResponse,
            User,
            UserRole,
            CreateUserDto,
            UpdateUserDto,
            UpdateProfileDto,
            ChangePasswordDto,
            PaginatedUsersResponse,
            Subject,
            CreateSubjectDto,
            UpdateSubjectDto,
            PaginatedSubjectsResponse,
            Commission,
            Shift,
            CreateCommissionDto,
            UpdateCommissionDto,
            PaginatedCommissionsResponse,
            EnrolledStudent,
            EnrollStudentsDto,
            EnrollmentResponse,
            Schedule,
            ClassTime,
            WeekdaySchedule,
            CreateScheduleDto,
            UpdateScheduleDto,
            Content,
            WeeklyContent,
            CreateContentDto,
            UpdateContentDto,
            PaginatedContentsResponse,
            Evaluation,
            EvaluationKind,
            CreateEvaluationDto,
            UpdateEvaluationDto,
            PaginatedEvaluationsResponse,
            Grade,
            GradeEntry,
            RecordGradesDto,
            RecordGradesResponse,
            StudentGrade,
            SubjectGradeSummary,
            Notification,
            NotificationKind,
            PaginatedNotificationsResponse,
            UnreadCountResponse,
            MarkAllReadResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Users", description = "Own profile and admin user management"),
        (name = "Subjects", description = "Subjects of the study plan"),
        (name = "Commissions", description = "Commissions of a subject and their enrolled students"),
        (name = "Schedules", description = "Weekly class sessions"),
        (name = "Contents", description = "Course content published per subject"),
        (name = "Evaluations", description = "Exams, assignments and other evaluations"),
        (name = "Grades", description = "Grades per evaluation and student"),
        (name = "Notifications", description = "In-app notifications of the current user")
    ),
    info(
        title = "Cuaderno API",
        version = "0.1.0",
        description = "Academic organizer REST API built with Rust, Axum and SQLite: subjects, commissions, schedules, contents, evaluations and grades, with JWT authentication and notification fan-out.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
