//! OTLP/gRPC logs service

use crate::receiver::LogReceiver;
use crate::telemetry::ExportRequest;

use futures::stream;
use opentelemetry_proto::tonic::collector::logs::v1::logs_service_server::{
    LogsService, LogsServiceServer,
};
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use std::future::Future;
use tokio::net::TcpListener;
use tonic::codec::CompressionEncoding;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{debug, error};

/// `LogsService/Export` backed by a [`LogReceiver`].
#[derive(Clone)]
pub struct LogsGrpcService {
    receiver: LogReceiver,
}

impl LogsGrpcService {
    pub fn new(receiver: LogReceiver) -> Self {
        Self { receiver }
    }

    /// Wrap in the generated tonic server, accepting gzip request bodies.
    pub fn into_server(self) -> LogsServiceServer<Self> {
        LogsServiceServer::new(self).accept_compressed(CompressionEncoding::Gzip)
    }
}

#[tonic::async_trait]
impl LogsService for LogsGrpcService {
    async fn export(
        &self,
        request: Request<ExportLogsServiceRequest>,
    ) -> Result<Response<ExportLogsServiceResponse>, Status> {
        self.receiver.stats().record_grpc_request();

        let remote = request.remote_addr();
        let export = ExportRequest::from(request.into_inner());
        debug!(
            "Received gRPC export from {:?}: {} resource logs, {} records",
            remote,
            export.resource_logs.len(),
            export.record_count()
        );

        match self.receiver.write_request(&export).await {
            Ok(_) => Ok(Response::new(ExportLogsServiceResponse::default())),
            Err(e) => {
                error!("Failed to store gRPC export: {}", e);
                Err(Status::internal(e.to_string()))
            }
        }
    }
}

/// Serve the logs service on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    receiver: LogReceiver,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    F: Future<Output = ()>,
{
    let incoming = Box::pin(stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await.map(|(socket, _)| socket);
        Some((accepted, listener))
    }));

    Server::builder()
        .add_service(LogsGrpcService::new(receiver).into_server())
        .serve_with_incoming_shutdown(incoming, shutdown)
        .await
}
