//! # Conduit API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod session;
mod state;
mod telemetry;

#[cfg(test)]
mod tests;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::init_telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    init_telemetry(&config.telemetry);
    config.warn_on_default_secrets();

    tracing::info!(
        host = %config.host,
        port = config.port,
        production = config.production,
        "Starting Conduit API Server"
    );

    let state = AppState::new(&config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    #[cfg(feature = "scheduler")]
    let mut scheduler =
        match background::start_reconciliation(state.graph.clone(), &config.scheduler).await {
            Ok(scheduler) => Some(scheduler),
            Err(e) => {
                tracing::error!(error = %e, "Failed to start the reconciliation scheduler");
                None
            }
        };

    let result = HttpServer::new(move || {
        let login_limiter = state.login_limiter.clone();
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::extractor_config)
            .configure(|cfg| handlers::configure_routes(cfg, login_limiter))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }

    result
}
