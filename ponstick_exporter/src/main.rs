//! Entry point for ponstick_exporter: read config, load the script, serve.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use ponstick_exporter::config::{parse_port, Config, DEFAULT_LISTEN_PORT};
use ponstick_exporter::http::router;
use ponstick_exporter::metrics::ExporterMetrics;
use ponstick_exporter::remote::SshExecutor;
use ponstick_exporter::scrape::Scraper;
use ponstick_exporter::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: ponstick_exporter [--port PORT|-p PORT]\n\
\n\
Environment:\n\
  SSH_PASSWORD      remote password (required)\n\
  SSH_HOST          remote host (default 192.168.11.1)\n\
  SSH_PORT          remote port (default 22)\n\
  SSH_USERNAME      remote user (default root)\n\
  LUA_SCRIPT_PATH   diagnostic script (default gpon_status.lua)\n\
  SSH_TIMEOUT_SECS  deadline for one remote run (default 30)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }
    let port = parse_port(args, DEFAULT_LISTEN_PORT);

    let config = Config::from_env()?;
    let script = config.load_script()?;
    info!(ssh = ?config.target, timeout = ?config.timeout, "loaded configuration");

    let metrics = ExporterMetrics::new().context("failed to register metrics")?;
    let executor = Arc::new(SshExecutor::new(config.target.clone(), config.timeout));
    let scraper = Scraper::new(metrics, executor, script, config.timeout);
    let app = router(AppState::new(scraper));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
