//! Receiver core shared by the gRPC and HTTP transports

use crate::config::Config;
use crate::decoder::{Decoder, ProtobufDecoder};
use crate::errors::{DecodeError, Result, WriteError};
use crate::sink::Sink;
use crate::telemetry::ExportRequest;
use crate::transport::{grpc, http};

use actix_web::dev::Server;

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Owns the sink and decoder handed to both transports.
///
/// Cloning is cheap; every clone appends to the same sink.
#[derive(Clone)]
pub struct LogReceiver {
    sink: Arc<dyn Sink>,
    decoder: Arc<dyn Decoder>,
    stats: Arc<ReceiverStats>,
    receiver_id: String,
}

impl LogReceiver {
    pub fn new(sink: Arc<dyn Sink>, decoder: Arc<dyn Decoder>) -> Self {
        Self {
            sink,
            decoder,
            stats: Arc::new(ReceiverStats::new()),
            receiver_id: Uuid::new_v4().to_string(),
        }
    }

    /// Receiver speaking the OTLP protobuf encoding.
    pub fn with_protobuf(sink: Arc<dyn Sink>) -> Self {
        Self::new(sink, Arc::new(ProtobufDecoder))
    }

    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    /// Decode a raw payload, counting failures.
    pub fn decode(&self, bytes: &[u8]) -> std::result::Result<ExportRequest, DecodeError> {
        self.decoder.decode(bytes).inspect_err(|_| {
            self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
        })
    }

    /// Append every record of `request` in traversal order.
    ///
    /// Stops at the first failed append; records before it stay written.
    pub async fn write_request(&self, request: &ExportRequest) -> std::result::Result<usize, WriteError> {
        let mut written = 0;

        for resource_logs in &request.resource_logs {
            debug!(
                "Resource with {} attributes, {} scopes",
                resource_logs.resource.attributes.len(),
                resource_logs.scope_logs.len()
            );

            for scope_logs in &resource_logs.scope_logs {
                debug!(
                    "Scope '{}' with {} log records",
                    scope_logs.scope.name,
                    scope_logs.log_records.len()
                );

                for record in &scope_logs.log_records {
                    if let Err(e) = self.sink.append(record).await {
                        self.stats.write_failures.fetch_add(1, Ordering::Relaxed);
                        warn!("Stopping after {} of {} records: {}", written, request.record_count(), e);
                        return Err(e);
                    }
                    self.stats.records_written.fetch_add(1, Ordering::Relaxed);
                    written += 1;
                }
            }
        }

        info!(
            "Wrote {} log records, total is now {}",
            written,
            self.stats.records_written.load(Ordering::Relaxed)
        );
        Ok(written)
    }

    /// Bind both listeners from `config` and serve until ctrl-c.
    #[instrument(skip_all, fields(receiver_id = %self.receiver_id))]
    pub async fn start(&self, config: &Config) -> Result<()> {
        let grpc_listener = TcpListener::bind(config.grpc_addr).await?;
        let http_listener = std::net::TcpListener::bind(config.http_addr)?;

        info!("gRPC listening on {}", grpc_listener.local_addr()?);
        info!("HTTP listening on {}{}", http_listener.local_addr()?, config.http_path);

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for shutdown signal: {}", e);
            }
            info!("Shutting down log receiver");
        };

        self.serve_with_listeners(config, grpc_listener, http_listener, shutdown)
            .await
    }

    /// Run both transports on already bound listeners until `shutdown` resolves.
    pub async fn serve_with_listeners<F>(
        &self,
        config: &Config,
        grpc_listener: TcpListener,
        http_listener: std::net::TcpListener,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let http_server = http::server(self.clone(), config, http_listener)?;

        let reporter = config
            .stats_interval()
            .map(|every| tokio::spawn(self.clone().report_stats(every)));

        let result = self.run_transports(grpc_listener, http_server, shutdown).await;

        if let Some(reporter) = reporter {
            reporter.abort();
        }

        let stats = self.stats.snapshot();
        info!(
            "Final receiver stats - {} records written, {} gRPC requests, {} HTTP requests, {} decode failures, {} write failures",
            stats.records_written,
            stats.grpc_requests,
            stats.http_requests,
            stats.decode_failures,
            stats.write_failures
        );

        result?;
        info!("Log receiver shutdown complete");
        Ok(())
    }

    /// Drive both servers until `shutdown` resolves or either one stops.
    async fn run_transports<F>(
        &self,
        grpc_listener: TcpListener,
        http_server: Server,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let http_handle = http_server.handle();
        let (http_stopped_tx, http_stopped_rx) = oneshot::channel::<()>();

        let grpc_shutdown = async move {
            tokio::select! {
                _ = shutdown => {}
                _ = http_stopped_rx => warn!("HTTP server stopped, shutting down gRPC"),
            }
        };

        let grpc_server = async {
            let result = grpc::serve(self.clone(), grpc_listener, grpc_shutdown).await;
            // gRPC ends on shutdown or on failure; the HTTP side follows it.
            http_handle.stop(true).await;
            result
        };

        let http_server = async move {
            let result = http_server.await;
            let _ = http_stopped_tx.send(());
            result
        };

        let (grpc_result, http_result) = tokio::join!(grpc_server, http_server);
        grpc_result?;
        http_result?;
        Ok(())
    }

    /// Log statistics periodically
    async fn report_stats(self, every: Duration) {
        let mut ticker = interval(every);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let stats = self.stats.snapshot();
            info!(
                "Receiver stats - {} records written, {} gRPC requests, {} HTTP requests, {} decode failures, {} write failures, up {}s",
                stats.records_written,
                stats.grpc_requests,
                stats.http_requests,
                stats.decode_failures,
                stats.write_failures,
                stats.uptime_secs
            );
        }
    }
}

/// Counters shared by both transports.
#[derive(Debug)]
pub struct ReceiverStats {
    started_at: DateTime<Utc>,
    grpc_requests: AtomicU64,
    http_requests: AtomicU64,
    records_written: AtomicU64,
    decode_failures: AtomicU64,
    write_failures: AtomicU64,
}

impl ReceiverStats {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            grpc_requests: AtomicU64::new(0),
            http_requests: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    pub fn record_grpc_request(&self) {
        self.grpc_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReceiverStatsSnapshot {
        ReceiverStatsSnapshot {
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            grpc_requests: self.grpc_requests.load(Ordering::Relaxed),
            http_requests: self.http_requests.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ReceiverStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverStatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub grpc_requests: u64,
    pub http_requests: u64,
    pub records_written: u64,
    pub decode_failures: u64,
    pub write_failures: u64,
}
