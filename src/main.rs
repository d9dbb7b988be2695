//! `labstage` CLI entry point.
//!
//! ```bash
//! labstage --port /dev/ttyUSB0 move 2 5000
//! labstage --config stage.toml status 1
//! ```

// Global allocator (Microsoft Rust Guidelines: M-MIMALLOC-APPS)
#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use labstage::cli::{self, Cli};
use labstage::config::Settings;
use labstage::logging::{self, TracingConfig};
use labstage_driver_optosigma::Sbis26;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply(&cli.overrides());
    settings.validate()?;

    let tracing_config = TracingConfig::from_settings(&settings.logging).map_err(anyhow::Error::msg)?;
    logging::init(tracing_config).map_err(anyhow::Error::msg)?;

    tracing::debug!(port = %settings.stage.port, baud = settings.stage.baud_rate, "Connecting to SBIS26");
    let stage = Sbis26::connect(&settings.stage)
        .await
        .with_context(|| format!("Failed to open SBIS26 on {}", settings.stage.port))?;

    let output = cli::execute(&stage, &cli.command).await?;
    println!("{output}");
    Ok(())
}
