use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};

use cuaderno::logging::{init_tracing, shutdown_tracer};
use cuaderno::messaging::{NotificationBus, NotificationWorker};
use cuaderno::metrics::{init_metrics, metrics_app};
use cuaderno::router::init_router;
use cuaderno::state::AppState;
use cuaderno_config::{BrokerConfig, ServerConfig};
use cuaderno_db::{DatabaseConfig, init_db_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let metrics_handle = init_metrics();

    let db = init_db_pool(&DatabaseConfig::from_env())
        .await
        .context("Failed to open database")?;
    run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    let mut bus = NotificationBus::connect(&BrokerConfig::from_env())
        .await
        .context("Failed to connect notification broker")?;

    let state = AppState::from_env(db.clone(), bus.publisher());
    let worker = bus.spawn_worker(NotificationWorker::new(db, state.email_config.clone()));
    if worker.is_none() {
        warn!("Notification broker disabled, notifications will not be delivered");
    }

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let server_config = ServerConfig::from_env();
    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("🚀 Server running on http://{address}");
    info!("📚 Swagger UI available at http://{address}/swagger-ui");
    info!("📖 Scalar UI available at http://{address}/scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
