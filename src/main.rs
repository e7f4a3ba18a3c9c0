//! Payroll engine HTTP server.
//!
//! Reads `payroll.yaml` from `PAYROLL_CONFIG_DIR` (default `./config`) and
//! serves the payroll API on the configured bind address. Log verbosity is
//! controlled with `RUST_LOG` (default `info`).

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;

const CONFIG_DIR_ENV: &str = "PAYROLL_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = "./config";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config_dir =
        std::env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    let bind_address = config.server().bind_address.clone();
    info!(
        config_dir = %config_dir,
        default_fine_rate = %config.config().default_fine_per_missed_hour,
        "Configuration loaded"
    );

    let router = create_router(AppState::new(config));
    let listener = TcpListener::bind(&bind_address).await?;
    info!(bind_address = %bind_address, "Payroll engine listening");

    axum::serve(listener, router).await?;
    Ok(())
}
