use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use cuaderno_core::AppError;

use crate::docs::ApiDoc;
use crate::logging::{REQUEST_ID_HEADER, logging_middleware};
use crate::metrics::metrics_middleware;
use crate::middleware::role::require_admin;
use crate::modules::auth::router::init_auth_router;
use crate::modules::commissions::router::init_commissions_router;
use crate::modules::contents::router::init_contents_router;
use crate::modules::evaluations::router::init_evaluations_router;
use crate::modules::grades::router::init_grades_router;
use crate::modules::notifications::router::init_notifications_router;
use crate::modules::schedules::router::init_schedules_router;
use crate::modules::subjects::router::init_subjects_router;
use crate::modules::users::{init_profile_router, init_users_router};
use crate::state::AppState;

async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1").execute(&state.db).await?;
    Ok(Json(json!({ "status": "ok" })))
}

fn auth_router(state: &AppState) -> Router<AppState> {
    match state.rate_limit_config.auth_governor_config() {
        Some(config) => {
            info!(
                per_second = state.rate_limit_config.auth_per_second,
                burst_size = state.rate_limit_config.auth_burst_size,
                "Rate limiting enabled on auth routes"
            );
            init_auth_router().layer(GovernorLayer::new(Arc::new(config)))
        }
        None => init_auth_router(),
    }
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", auth_router(&state))
                .nest(
                    "/users",
                    init_profile_router().merge(
                        init_users_router()
                            .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
                    ),
                )
                .nest("/subjects", init_subjects_router())
                .nest("/commissions", init_commissions_router())
                .nest("/schedules", init_schedules_router())
                .nest("/contents", init_contents_router())
                .nest("/evaluations", init_evaluations_router())
                .nest("/grades", init_grades_router())
                .nest("/notifications", init_notifications_router()),
        )
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
