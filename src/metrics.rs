use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

/// Installs the Prometheus recorder and spawns its upkeep task.
///
/// Returns `None` when observability is disabled or a recorder is already
/// installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full("http_request_duration_seconds".to_string()),
        &[
            0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
        ],
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid histogram buckets, metrics disabled");
            return None;
        }
    };

    let handle = match builder.install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            return None;
        }
    };

    // Spawn upkeep task to clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let uri_path = req.uri().path().to_owned();

    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or(uri_path);

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    let status_str = status.to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status_str).increment(1);

    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router serving the Prometheus exposition at `/metrics`.
pub fn metrics_app<S>(handle: PrometheusHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics helpers

pub fn track_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_user_login_success(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
}

pub fn track_user_login_failure(reason: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason.to_string()).increment(1);
}

pub fn track_jwt_issued() {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total").increment(1);
}

/// Track notification fan-out
pub fn track_notification_published(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("notifications_published_total", "kind" => kind.to_string(), "status" => "success")
        .increment(1);
}

pub fn track_notification_publish_failed(kind: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("notifications_published_total", "kind" => kind.to_string(), "status" => "failure")
        .increment(1);
}

pub fn track_notification_delivered(kind: &str, emailed: bool) {
    if !is_observability_enabled() {
        return;
    }
    let channel = if emailed { "email" } else { "in_app" };
    counter!("notifications_delivered_total", "kind" => kind.to_string(), "channel" => channel)
        .increment(1);
}

pub fn track_grades_recorded(count: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("grades_recorded_total").increment(count as u64);
}

pub fn track_schedule_conflict() {
    if !is_observability_enabled() {
        return;
    }
    counter!("schedule_conflicts_total").increment(1);
}
