//! Error types for the log receiver

use std::fmt;

pub type Result<T> = std::result::Result<T, ReceiverError>;

#[derive(Debug)]
pub enum ReceiverError {
    /// IO operation failed
    Io(std::io::Error),

    /// gRPC server failed
    Transport(tonic::transport::Error),

    /// Configuration error
    Config(String),

    /// Log record could not be written to the sink
    Write(WriteError),
}

impl fmt::Display for ReceiverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiverError::Io(err) => write!(f, "IO error: {}", err),
            ReceiverError::Transport(err) => write!(f, "Transport error: {}", err),
            ReceiverError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ReceiverError::Write(err) => write!(f, "Write error: {}", err),
        }
    }
}

impl std::error::Error for ReceiverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReceiverError::Io(err) => Some(err),
            ReceiverError::Transport(err) => Some(err),
            ReceiverError::Write(err) => Some(err),
            ReceiverError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for ReceiverError {
    fn from(err: std::io::Error) -> Self {
        ReceiverError::Io(err)
    }
}

impl From<tonic::transport::Error> for ReceiverError {
    fn from(err: tonic::transport::Error) -> Self {
        ReceiverError::Transport(err)
    }
}

impl From<WriteError> for ReceiverError {
    fn from(err: WriteError) -> Self {
        ReceiverError::Write(err)
    }
}

/// Malformed export payload. Never retried; callers see a client error.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError(prost::DecodeError);

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OTLP protobuf payload: {}", self.0)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<prost::DecodeError> for DecodeError {
    fn from(err: prost::DecodeError) -> Self {
        DecodeError(err)
    }
}

/// Sink failure. Never retried; callers see a server error.
#[derive(Debug)]
pub enum WriteError {
    /// The underlying file write failed
    Io(std::io::Error),

    /// The record could not be rendered to text
    Render(serde_json::Error),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteError::Io(err) => write!(f, "failed to write log record: {}", err),
            WriteError::Render(err) => write!(f, "failed to render log record: {}", err),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Io(err) => Some(err),
            WriteError::Render(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for WriteError {
    fn from(err: std::io::Error) -> Self {
        WriteError::Io(err)
    }
}

impl From<serde_json::Error> for WriteError {
    fn from(err: serde_json::Error) -> Self {
        WriteError::Render(err)
    }
}
