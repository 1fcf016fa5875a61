//! Configuration management for the log receiver

use crate::errors::{ReceiverError, Result};

use clap::Parser;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GRPC_ADDR: &str = "0.0.0.0:5317";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:5318";
pub const DEFAULT_HTTP_PATH: &str = "/v1/logs";
pub const DEFAULT_OUTPUT_PATH: &str = "received-logs.txt";
pub const DEFAULT_MAX_HTTP_BODY_BYTES: usize = 4 * 1024 * 1024;
pub const DEFAULT_STATS_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, Parser)]
#[command(name = "otlp_file_sink", version, about = "Receives OTLP logs over gRPC and HTTP and appends them to a file")]
pub struct Config {
    /// Address of the OTLP/gRPC listener
    #[arg(long, env = "RECEIVER_GRPC_ADDR", default_value = DEFAULT_GRPC_ADDR)]
    pub grpc_addr: SocketAddr,

    /// Address of the OTLP/HTTP listener
    #[arg(long, env = "RECEIVER_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub http_addr: SocketAddr,

    /// Route accepting protobuf export requests
    #[arg(long, env = "RECEIVER_HTTP_PATH", default_value = DEFAULT_HTTP_PATH)]
    pub http_path: String,

    /// File receiving one line per log record (truncated at startup)
    #[arg(long, env = "RECEIVER_OUTPUT_PATH", default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: PathBuf,

    /// Largest accepted HTTP request body
    #[arg(long, env = "RECEIVER_MAX_HTTP_BODY_BYTES", default_value_t = DEFAULT_MAX_HTTP_BODY_BYTES)]
    pub max_http_body_bytes: usize,

    /// Seconds between statistics reports, 0 disables them
    #[arg(long, env = "RECEIVER_STATS_INTERVAL_SECS", default_value_t = DEFAULT_STATS_INTERVAL_SECS)]
    pub stats_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grpc_addr: SocketAddr::from(([0, 0, 0, 0], 5317)),
            http_addr: SocketAddr::from(([0, 0, 0, 0], 5318)),
            http_path: DEFAULT_HTTP_PATH.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            max_http_body_bytes: DEFAULT_MAX_HTTP_BODY_BYTES,
            stats_interval_secs: DEFAULT_STATS_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from command line flags and environment variables.
    ///
    /// Unparseable flags exit with clap's usage message; parsed values that
    /// fail validation come back as [`ReceiverError::Config`].
    pub fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let config = Config::parse_from(args);
        config.validate().map_err(ReceiverError::Config)?;
        Ok(config)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.http_path.is_empty() || !self.http_path.starts_with('/') {
            return Err("http_path must start with '/'".to_string());
        }

        if self.output_path.as_os_str().is_empty() {
            return Err("output_path cannot be empty".to_string());
        }

        if self.max_http_body_bytes == 0 {
            return Err("max_http_body_bytes must be greater than 0".to_string());
        }

        if self.grpc_addr == self.http_addr {
            return Err("grpc_addr and http_addr must differ".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.grpc_addr.port(), 5317);
        assert_eq!(config.http_addr.port(), 5318);
        assert_eq!(config.http_path, "/v1/logs");
        assert_eq!(config.stats_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::parse_from([
            "otlp_file_sink",
            "--grpc-addr",
            "127.0.0.1:4317",
            "--http-addr",
            "127.0.0.1:4318",
            "--output-path",
            "/tmp/logs.txt",
            "--stats-interval-secs",
            "0",
        ]);

        assert_eq!(config.grpc_addr, "127.0.0.1:4317".parse::<SocketAddr>().unwrap());
        assert_eq!(config.http_addr.port(), 4318);
        assert_eq!(config.output_path, PathBuf::from("/tmp/logs.txt"));
        assert_eq!(config.stats_interval(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let shared_port = Config {
            http_addr: Config::default().grpc_addr,
            ..Config::default()
        };
        assert!(shared_port.validate().is_err());

        let relative_path = Config {
            http_path: "v1/logs".to_string(),
            ..Config::default()
        };
        assert!(relative_path.validate().is_err());

        let no_body = Config {
            max_http_body_bytes: 0,
            ..Config::default()
        };
        assert!(no_body.validate().is_err());

        let no_output = Config {
            output_path: PathBuf::new(),
            ..Config::default()
        };
        assert!(no_output.validate().is_err());
    }

    #[test]
    fn test_load_reports_invalid_values_as_config_errors() {
        let err = Config::load_from(["otlp_file_sink", "--http-path", "v1/logs"]).unwrap_err();
        assert!(matches!(err, ReceiverError::Config(ref msg) if msg.contains("http_path")));

        let err = Config::load_from([
            "otlp_file_sink",
            "--grpc-addr",
            "127.0.0.1:4318",
            "--http-addr",
            "127.0.0.1:4318",
        ])
        .unwrap_err();
        assert!(err.to_string().starts_with("Configuration error:"));

        let config = Config::load_from(["otlp_file_sink", "--http-addr", "127.0.0.1:4318"]).unwrap();
        assert_eq!(config.http_addr.port(), 4318);
    }
}
