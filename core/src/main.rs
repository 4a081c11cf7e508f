use clap::Parser;
use relaymq::{BrokerConfig, BrokerServer, Result};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "relaymq")]
#[command(about = "An in-memory, topic-keyed message broker")]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address (overrides the configuration file)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides the configuration file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Worker threads; 0 or less selects hardware concurrency
    #[arg(long)]
    threads: Option<i64>,

    /// Server deadline in seconds; 0 or less disables it
    #[arg(long)]
    timeout: Option<i64>,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(parse_log_level(&args.log_level))
        .init();

    // A broken configuration aborts here, before any socket is bound,
    // with a nonzero exit code.
    let mut config = match &args.config {
        Some(path) => BrokerConfig::from_file(path)?,
        None => BrokerConfig::from_env()?,
    };
    if let Some(host) = args.host {
        config.endpoint_address = host;
    }
    if let Some(port) = args.port {
        config.endpoint_port = port;
    }
    if let Some(threads) = args.threads {
        config.threads = threads;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = timeout;
    }

    let workers = config.worker_threads();
    info!(
        "starting relaymq on {}:{} with {} worker threads",
        config.endpoint_address, config.endpoint_port, workers
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(config))
}

async fn serve(config: BrokerConfig) -> Result<()> {
    let server = BrokerServer::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(ref e) = result {
                error!("server error: {}", e);
            }
            result
        }
        _ = shutdown_signal() => {
            info!("stop signal caught, shutting down");
            Ok(())
        }
    }
}

/// Resolves when SIGINT or SIGTERM is delivered.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => {
            warn!("invalid log level '{}', defaulting to 'info'", level);
            tracing::Level::INFO
        }
    }
}
