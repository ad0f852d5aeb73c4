//! RelayGate Server - Headless Daemon
//!
//! A multi-tenant reverse proxy that:
//! - Forwards `/proxy/*` and tenant-subdomain traffic, optionally through an
//!   upstream HTTP/SOCKS5 proxy chosen per request
//! - Exposes an admin REST API on /api/* (configs, tokens, metrics)
//! - Serves static files for everything else
//!
//! Access via: http://localhost:8080

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod api;
mod cli;
mod commands;
mod router;
mod server_utils;
mod state;
#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands};
use relaygate_core::metrics::prometheus;
use relaygate_core::modules::{config as core_config, logger};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(core_config::default_config_path);

    match cli.command {
        Some(Commands::GenKey { save }) => commands::handle_generate_key(&config_path, save),
        Some(Commands::CheckConfig { json }) => {
            let mut settings = core_config::load_config(&config_path)?;
            cli.serve.apply(&mut settings);
            commands::handle_check_config(&settings, json)
        },
        Some(Commands::Serve) | None => serve(&cli, config_path).await,
    }
}

async fn serve(cli: &Cli, config_path: PathBuf) -> Result<()> {
    let mut settings = core_config::load_config(&config_path)?;
    cli.serve.apply(&mut settings);
    core_config::validate_config(&settings)?;

    let _log_guard = logger::init_logger(&cli.log_level, settings.log_dir.as_deref());
    commands::ensure_admin_key(&settings)?;

    info!("🚀 RelayGate starting on {}:{}...", settings.host, settings.port);
    info!("⚙️ Settings from {}", config_path.display());

    if prometheus::init_metrics().is_some() {
        info!("📈 Prometheus exporter installed");
    }

    let state = AppState::from_settings(settings.clone())?;
    info!("✅ Application state initialized");
    info!("📊 {} tenant configs loaded", state.store().config_count());

    let metrics_task = state.metrics().start();
    let app = router::build_router(state.clone());
    let listener = server_utils::create_listener(&settings.host, settings.port)?;

    let addr = listener.local_addr()?;
    info!("🌐 Server listening on http://{}", addr);
    info!("🔌 Admin API at http://{}/api/", addr);
    info!("🔀 Proxy endpoint at http://{}/proxy", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(server_utils::shutdown_signal())
        .await?;

    state.metrics().stop();
    if let Err(e) = metrics_task.await {
        tracing::warn!("Metrics task ended abnormally: {}", e);
    }
    info!("👋 RelayGate stopped");
    Ok(())
}
