use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use recon_events::delivery::email::{EmailConfig, SmtpEmailTransport};
use recon_events::delivery::webhook::HttpWebhookTransport;
use recon_events::{AlertService, NotificationBus, NotificationDispatcher, StateFile};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recon_api::background::timeline_monitor;
use recon_api::config::ServerConfig;
use recon_api::notifications::NotificationForwarder;
use recon_api::router::build_app_router;
use recon_api::state::AppState;
use recon_api::ws;

/// How long each background task gets to finish after shutdown starts.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recon_api=debug,recon_events=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = recon_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    recon_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    recon_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Alert engine ---
    let bus = Arc::new(NotificationBus::default());
    let alerts = Arc::new(build_alert_service(&config, Arc::clone(&bus))?);
    alerts
        .load()
        .await
        .with_context(|| format!("Failed to load {}", config.state_file.display()))?;

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Background services ---
    let cancel = CancellationToken::new();

    let forwarder = NotificationForwarder::new(Arc::clone(&ws_manager));
    let forwarder_handle = tokio::spawn(forwarder.run(bus.subscribe(), cancel.clone()));

    let monitor_handle = tokio::spawn(timeline_monitor::run(
        pool.clone(),
        Arc::clone(&alerts),
        config.evaluation_interval(),
        cancel.clone(),
    ));
    tracing::info!("Background services started (notification forwarder, timeline monitor)");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        alerts: Arc::clone(&alerts),
        ws_manager: Arc::clone(&ws_manager),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, monitor_handle).await;
    let _ = tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, forwarder_handle).await;
    tracing::info!("Background services stopped");

    let dropped = alerts.escalations().cancel_all().await;
    tracing::info!(dropped, "Pending escalations cancelled");

    if let Err(e) = alerts.save().await {
        tracing::error!(error = %e, "Failed to save timeline state on shutdown");
    }

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;
    heartbeat_handle.abort();

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Assemble the alert service from configuration.
///
/// Email is enabled only when `SMTP_HOST` is set.
fn build_alert_service(config: &ServerConfig, bus: Arc<NotificationBus>) -> anyhow::Result<AlertService> {
    let webhook = HttpWebhookTransport::new(config.webhook_timeout())
        .context("Failed to build webhook HTTP client")?;
    let mut dispatcher = NotificationDispatcher::new(bus, Arc::new(webhook));

    match EmailConfig::from_env() {
        Some(email_config) => {
            let transport =
                SmtpEmailTransport::new(email_config).context("Failed to build SMTP transport")?;
            dispatcher = dispatcher.with_email(Arc::new(transport));
            tracing::info!("Email delivery enabled");
        }
        None => tracing::info!("SMTP_HOST not set, email delivery disabled"),
    }

    Ok(AlertService::new(dispatcher).with_state_file(StateFile::new(&config.state_file)))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix). If a handler cannot
/// be installed, that signal source is treated as never firing.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
