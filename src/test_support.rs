//! Shared fixtures for unit tests

use crate::errors::WriteError;
use crate::sink::{MemorySink, Sink};
use crate::telemetry::LogRecord;
use async_trait::async_trait;
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{AnyValue, InstrumentationScope, KeyValue, any_value};
use opentelemetry_proto::tonic::logs::v1::{self as logs, ResourceLogs, ScopeLogs};
use opentelemetry_proto::tonic::resource::v1::Resource;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) fn string_value(value: &str) -> AnyValue {
    AnyValue {
        value: Some(any_value::Value::StringValue(value.to_string())),
    }
}

pub(crate) fn log_record(body: &str) -> logs::LogRecord {
    logs::LogRecord {
        time_unix_nano: 1_700_000_000_000_000_000,
        severity_number: 9,
        severity_text: "INFO".to_string(),
        body: Some(string_value(body)),
        attributes: vec![KeyValue {
            key: "log-count".to_string(),
            value: Some(AnyValue {
                value: Some(any_value::Value::IntValue(1)),
            }),
        }],
        ..Default::default()
    }
}

/// Builds a request from `resources -> scopes -> record bodies`.
pub(crate) fn export_request(layout: &[&[&[&str]]]) -> ExportLogsServiceRequest {
    let resource_logs = layout
        .iter()
        .enumerate()
        .map(|(r, scopes)| ResourceLogs {
            resource: Some(Resource {
                attributes: vec![KeyValue {
                    key: "service.name".to_string(),
                    value: Some(string_value(&format!("service-{}", r))),
                }],
                ..Default::default()
            }),
            scope_logs: scopes
                .iter()
                .enumerate()
                .map(|(s, bodies)| ScopeLogs {
                    scope: Some(InstrumentationScope {
                        name: format!("scope-{}", s),
                        version: "1.0.0".to_string(),
                        ..Default::default()
                    }),
                    log_records: bodies.iter().map(|body| log_record(body)).collect(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
        .collect();

    ExportLogsServiceRequest { resource_logs }
}

/// Sink that accepts `fail_at` records and rejects every append after that.
#[derive(Debug)]
pub(crate) struct FailingSink {
    pub(crate) inner: MemorySink,
    fail_at: usize,
    calls: AtomicUsize,
}

impl FailingSink {
    pub(crate) fn new(fail_at: usize) -> Self {
        Self {
            inner: MemorySink::new(),
            fail_at,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for FailingSink {
    async fn append(&self, record: &LogRecord) -> Result<(), WriteError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_at {
            return Err(WriteError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.append(record).await
    }
}
