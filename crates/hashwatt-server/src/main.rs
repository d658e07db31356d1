use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hashwatt_core::{round2, weighted_efficiency, HashrateService, HashwattConfig, CONUS_SHARE};
use hashwatt_server::cli::Cli;
use hashwatt_server::{serve, ServerError};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = init_tracing(cli.log_filter.as_deref()) {
        eprintln!("error: {error}");
        return ExitCode::from(error.exit_code());
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "hashwatt stopped");
            ExitCode::from(error.exit_code())
        }
    }
}

/// `--log-filter` wins over `RUST_LOG`; both fall back to `info`.
fn init_tracing(filter: Option<&str>) -> Result<(), ServerError> {
    let env_filter = match filter {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| ServerError::LogFilter(e.to_string()))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = HashwattConfig::from_env()?;

    info!("Starting hashwatt");
    info!(
        "Fleet weighted efficiency: {:.2} J/TH",
        round2(weighted_efficiency())
    );
    info!("CONUS share: {:.1}%", CONUS_SHARE * 100.0);
    info!(
        "Luxor API: {}",
        if config.luxor_configured() {
            "Configured"
        } else {
            "Not configured (using free sources)"
        }
    );

    let service = Arc::new(HashrateService::from_config(&config)?);
    serve(cli.bind, service).await
}
