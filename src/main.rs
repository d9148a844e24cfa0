use anyhow::{Context, Result};
use avatar_session::{create_router, AppState, Config};
use clap::Parser;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "avatar-session", about = "Turn-based avatar conversation service")]
struct Args {
    /// Path to the service configuration file (without extension)
    #[arg(long, default_value = "config/avatar-session")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let cfg = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Could not load config from {}: {:#}", args.config, e);
            warn!("Falling back to built-in defaults");
            Config::default()
        }
    };

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Reply timeout: {}s, speaking hold: {}ms",
        cfg.session.reply_timeout_secs, cfg.session.speaking_hold_ms
    );

    let state = AppState::new(cfg.session.clone());
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router)
        .await
        .context("HTTP server error")?;

    Ok(())
}
