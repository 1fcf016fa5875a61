//! OTLP/HTTP endpoint accepting protobuf export requests

use crate::config::Config;
use crate::receiver::LogReceiver;

use actix_web::dev::Server;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use tracing::{debug, error, warn};
use uuid::Uuid;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Register the export route on an actix application.
///
/// Requests with `Content-Encoding: gzip` are decompressed by actix before
/// the body reaches the handler.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    receiver: &LogReceiver,
    path: &str,
    max_body_bytes: usize,
) {
    cfg.app_data(web::Data::new(receiver.clone()))
        .app_data(web::PayloadConfig::new(max_body_bytes))
        .service(web::resource(path).route(web::post().to(export_logs)));
}

/// Build the HTTP server on an already bound listener.
///
/// Signal handling is left to the caller, which stops the server through
/// its handle.
pub fn server(
    receiver: LogReceiver,
    config: &Config,
    listener: std::net::TcpListener,
) -> std::io::Result<Server> {
    let path = config.http_path.clone();
    let max_body_bytes = config.max_http_body_bytes;

    let server = HttpServer::new(move || {
        App::new().configure(|cfg| configure(cfg, &receiver, &path, max_body_bytes))
    })
    .disable_signals()
    .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
    .listen(listener)?
    .run();

    Ok(server)
}

async fn export_logs(
    receiver: web::Data<LogReceiver>,
    request: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let request_id = Uuid::new_v4();
    receiver.stats().record_http_request();

    debug!("[{}] Received HTTP request: {} {}", request_id, request.method(), request.path());
    for (name, value) in request.headers() {
        debug!("[{}] {}: {:?}", request_id, name, value);
    }

    let export = match receiver.decode(&body) {
        Ok(export) => export,
        Err(e) => {
            warn!("[{}] Rejecting {} byte body: {}", request_id, body.len(), e);
            return HttpResponse::BadRequest()
                .content_type(TEXT_PLAIN)
                .body(e.to_string());
        }
    };

    debug!(
        "[{}] Decoded {} resource logs, {} records",
        request_id,
        export.resource_logs.len(),
        export.record_count()
    );

    if let Err(e) = receiver.write_request(&export).await {
        error!("[{}] Failed to store HTTP export: {}", request_id, e);
        return HttpResponse::InternalServerError()
            .content_type(TEXT_PLAIN)
            .body(e.to_string());
    }

    let decoder = receiver.decoder();
    HttpResponse::Ok()
        .content_type(decoder.content_type())
        .body(decoder.empty_response())
}
