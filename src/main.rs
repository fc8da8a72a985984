//! # Call Audio Cleaner - Main Application Entry Point
//!
//! HTTP service that removes background noise from 8 kHz μ-law telephony
//! audio. Callers post base64 μ-law, the service runs it through a frame based
//! noise suppressor at 48 kHz and returns base64 μ-law of the same framing.
//!
//! ## Application Architecture:
//! - **audio**: The cleaning pipeline (codec, framing, resampling, suppression)
//! - **config**: Application configuration (config file + environment variables)
//! - **state**: Shared application state, the injected suppressor and metrics
//! - **health**: Status, health and metrics endpoints
//! - **middleware**: Request id logging and per-endpoint metrics
//! - **handlers**: `/clean-audio` and runtime configuration endpoints
//! - **error**: Error types and their HTTP responses

mod audio;
mod config;
mod error;
mod handlers;
mod health;
mod middleware;
mod state;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use config::AppConfig;
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Set once a termination signal arrives.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting call-audio-cleaner v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    let app_state = build_state(config.clone());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .wrap(middleware::MetricsMiddleware)
            .wrap(middleware::RequestLogging)
            .configure(handlers::configure)
    })
    .bind(&bind_addr)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Build the suppressor named in the configuration and inject it into the
/// shared state. A backend that fails to initialize leaves the service up in
/// degraded mode: health reports it and cleaning requests get 503.
fn build_state(config: AppConfig) -> AppState {
    if !config.suppression.enabled {
        warn!("Noise suppression disabled; /clean-audio will answer 503");
        return AppState::new(config);
    }

    match audio::build_suppressor(&config.suppression.backend) {
        Ok(suppressor) => {
            info!(backend = suppressor.name(), "Noise suppressor ready");
            AppState::with_suppressor(config, suppressor)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize noise suppressor; running degraded");
            AppState::new(config)
        }
    }
}

/// `RUST_LOG` wins; otherwise debug for this crate and info for actix.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "call_audio_cleaner=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

/// Flip `SHUTDOWN_SIGNAL` on SIGTERM or SIGINT so in-flight cleanings can finish.
fn setup_signal_handlers() {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to install signal handlers: {}", e);
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }
}
