//! OTLP Log File Sink Binary

use otlp_file_sink::{Config, FileSink, LogReceiver, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    initialize_tracing();

    info!("Starting OTLP log file sink v{}", env!("CARGO_PKG_VERSION"));

    // Load and validate configuration
    let config = match Config::load_from(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Receiver configuration - gRPC: {}, HTTP: {}{}, Output: {}",
        config.grpc_addr,
        config.http_addr,
        config.http_path,
        config.output_path.display()
    );

    let sink = FileSink::create(&config.output_path).await?;
    let receiver = LogReceiver::with_protobuf(Arc::new(sink));

    if let Err(e) = receiver.start(&config).await {
        error!("Receiver failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
