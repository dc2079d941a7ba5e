use aif_cli::{Cli, dispatch};
use anyhow::{Context, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // An explicit file must exist; the default ./.env is optional.
    let loaded = match &cli.env_file {
        Some(path) => Some(
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))
                .map(|()| path.clone())?,
        ),
        None => dotenvy::dotenv().ok(),
    };

    if let Err(e) = aif_telemetry::init_with_format("aif-cli", cli.log_format.into()) {
        eprintln!("Failed to initialize telemetry: {e}");
    }
    if let Some(path) = loaded {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    dispatch(cli.command, std::io::stdout().lock()).await
}
