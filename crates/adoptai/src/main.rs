mod api;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;

use adoptai_logging::{init_tracing, LogFormat};
use adoptai_schedule::{DatasetKeys, LocalStore, ObjectStore, S3Store, ScheduleCache, SystemClock};

use config::{Backend, Overrides, ServerConfig, Settings, CONFIG_FILE_NAME};

#[derive(Parser, Debug)]
#[command(
    name = "adoptai",
    about = "Read-only HTTP API over the AdoptAI conference schedule",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ./adoptai.toml)
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Address to listen on
    #[arg(long, env = "ADOPTAI_BIND")]
    bind: Option<String>,

    /// S3 bucket holding the datasets
    #[arg(long, env = "BUCKET_NAME")]
    bucket: Option<String>,

    /// Key prefix of the datasets
    #[arg(long, env = "DATA_PREFIX")]
    data_prefix: Option<String>,

    /// Serve datasets from a local directory instead of S3
    #[arg(long, env = "ADOPTAI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// AWS region of the bucket
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Custom S3 endpoint (e.g. MinIO, LocalStack)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, env = "ADOPTAI_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    log_format: Option<LogFormatChoice>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            bind: self.bind.clone(),
            bucket: self.bucket.clone(),
            data_prefix: self.data_prefix.clone(),
            data_dir: self.data_dir.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format.map(Into::into),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = ServerConfig::load(&cli.config)?.unwrap_or_default();
    let settings = Settings::resolve(file_config, cli.overrides())?;

    init_tracing(&settings.log_level, settings.log_format);

    let store: Arc<dyn ObjectStore> = match &settings.backend {
        Backend::Local(dir) => Arc::new(LocalStore::new(dir)),
        Backend::S3(s3) => Arc::new(S3Store::new(s3.clone()).await),
    };
    info!(store = %store.describe(), prefix = %settings.data_prefix, "Using dataset store");

    let cache = ScheduleCache::new(
        store,
        DatasetKeys::with_prefix(&settings.data_prefix),
        settings.timezone,
    )
    .with_fetch_timeout(settings.fetch_timeout);

    let state = api::AppState::new(cache, Arc::new(SystemClock), &settings.service_name);
    let router = api::create_router(state);

    serve(router, &settings).await
}

async fn serve(router: axum::Router, settings: &Settings) -> Result<()> {
    use colored::Colorize;

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Failed to bind API server to {}", settings.bind))?;
    let local_addr = listener
        .local_addr()
        .context("Failed to read listener address")?;

    eprintln!();
    eprintln!(
        "  {} {}",
        "->".bright_green(),
        format!("{} listening on http://{}", settings.service_name, local_addr).bold()
    );
    eprintln!(
        "  {} Timezone {}",
        "->".dimmed(),
        settings.timezone.name().bold()
    );
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}
