//! OTLP Log File Sink Library
//!
//! This library receives OpenTelemetry log exports over gRPC and HTTP,
//! normalizes both into one record model and appends every log record to a
//! shared line-oriented file.

pub mod config;
pub mod decoder;
pub mod errors;
pub mod receiver;
pub mod sink;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use decoder::{Decoder, ProtobufDecoder};
pub use errors::{DecodeError, ReceiverError, Result, WriteError};
pub use receiver::{LogReceiver, ReceiverStats, ReceiverStatsSnapshot};
pub use sink::{FileSink, MemorySink, Sink};
pub use telemetry::{AnyValue, ExportRequest, KeyValue, LogRecord};
