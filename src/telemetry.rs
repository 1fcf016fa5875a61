//! Log record model decoded from OTLP export requests
//!
//! Both transports normalize their payload into [`ExportRequest`]. Absent wire
//! fields become zero values, so nothing downstream deals with `Option`s from
//! the protobuf layer. A [`LogRecord`] renders to a single canonical JSON line,
//! which is what the sink persists.

use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::common::v1 as common;
use opentelemetry_proto::tonic::common::v1::any_value;
use opentelemetry_proto::tonic::logs::v1 as logs;
use opentelemetry_proto::tonic::resource::v1 as resource;
use serde::{Deserialize, Serialize};

/// One export call's full payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportRequest {
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceLogs {
    pub resource: Resource,
    pub scope_logs: Vec<ScopeLogs>,
    pub schema_url: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeLogs {
    pub scope: InstrumentationScope,
    pub log_records: Vec<LogRecord>,
    pub schema_url: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
}

/// A single structured log event.
///
/// Field order here is the key order of the rendered line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub time_unix_nano: u64,
    pub observed_time_unix_nano: u64,
    pub severity_number: i32,
    pub severity_text: String,
    pub body: AnyValue,
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
    pub flags: u32,
    #[serde(with = "hex_bytes")]
    pub trace_id: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub span_id: Vec<u8>,
    pub event_name: String,
}

/// Attributes are kept as an ordered list; duplicate keys survive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnyValue {
    #[default]
    Empty,
    StringValue(String),
    BoolValue(bool),
    IntValue(i64),
    DoubleValue(#[serde(with = "double")] f64),
    BytesValue(#[serde(with = "hex_bytes")] Vec<u8>),
    ArrayValue(Vec<AnyValue>),
    KvlistValue(Vec<KeyValue>),
}

impl ExportRequest {
    /// Records in traversal order: resource, then scope, then record.
    pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
        self.resource_logs
            .iter()
            .flat_map(|resource_logs| resource_logs.scope_logs.iter())
            .flat_map(|scope_logs| scope_logs.log_records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }
}

impl LogRecord {
    /// Render as one JSON line (without the terminator).
    pub fn render(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Inverse of [`LogRecord::render`]. A trailing line terminator is ignored.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end_matches(['\r', '\n']))
    }
}

impl From<ExportLogsServiceRequest> for ExportRequest {
    fn from(request: ExportLogsServiceRequest) -> Self {
        Self {
            resource_logs: request.resource_logs.into_iter().map(ResourceLogs::from).collect(),
        }
    }
}

impl From<logs::ResourceLogs> for ResourceLogs {
    fn from(resource_logs: logs::ResourceLogs) -> Self {
        Self {
            resource: resource_logs.resource.map(Resource::from).unwrap_or_default(),
            scope_logs: resource_logs.scope_logs.into_iter().map(ScopeLogs::from).collect(),
            schema_url: resource_logs.schema_url,
        }
    }
}

impl From<resource::Resource> for Resource {
    fn from(resource: resource::Resource) -> Self {
        Self {
            attributes: key_values(resource.attributes),
            dropped_attributes_count: resource.dropped_attributes_count,
        }
    }
}

impl From<logs::ScopeLogs> for ScopeLogs {
    fn from(scope_logs: logs::ScopeLogs) -> Self {
        Self {
            scope: scope_logs.scope.map(InstrumentationScope::from).unwrap_or_default(),
            log_records: scope_logs.log_records.into_iter().map(LogRecord::from).collect(),
            schema_url: scope_logs.schema_url,
        }
    }
}

impl From<common::InstrumentationScope> for InstrumentationScope {
    fn from(scope: common::InstrumentationScope) -> Self {
        Self {
            name: scope.name,
            version: scope.version,
            attributes: key_values(scope.attributes),
            dropped_attributes_count: scope.dropped_attributes_count,
        }
    }
}

impl From<logs::LogRecord> for LogRecord {
    fn from(record: logs::LogRecord) -> Self {
        Self {
            time_unix_nano: record.time_unix_nano,
            observed_time_unix_nano: record.observed_time_unix_nano,
            severity_number: record.severity_number,
            severity_text: record.severity_text,
            body: record.body.map(AnyValue::from).unwrap_or_default(),
            attributes: key_values(record.attributes),
            dropped_attributes_count: record.dropped_attributes_count,
            flags: record.flags,
            trace_id: record.trace_id,
            span_id: record.span_id,
            event_name: record.event_name,
        }
    }
}

impl From<common::KeyValue> for KeyValue {
    fn from(kv: common::KeyValue) -> Self {
        Self {
            key: kv.key,
            value: kv.value.map(AnyValue::from).unwrap_or_default(),
        }
    }
}

impl From<common::AnyValue> for AnyValue {
    fn from(value: common::AnyValue) -> Self {
        match value.value {
            None => AnyValue::Empty,
            Some(any_value::Value::StringValue(s)) => AnyValue::StringValue(s),
            Some(any_value::Value::BoolValue(b)) => AnyValue::BoolValue(b),
            Some(any_value::Value::IntValue(i)) => AnyValue::IntValue(i),
            Some(any_value::Value::DoubleValue(d)) => AnyValue::DoubleValue(d),
            Some(any_value::Value::BytesValue(bytes)) => AnyValue::BytesValue(bytes),
            Some(any_value::Value::ArrayValue(array)) => {
                AnyValue::ArrayValue(array.values.into_iter().map(AnyValue::from).collect())
            }
            Some(any_value::Value::KvlistValue(list)) => {
                AnyValue::KvlistValue(key_values(list.values))
            }
        }
    }
}

fn key_values(attributes: Vec<common::KeyValue>) -> Vec<KeyValue> {
    attributes.into_iter().map(KeyValue::from).collect()
}

/// Lowercase hex for opaque byte strings.
mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(&text).map_err(D::Error::custom)
    }
}

/// JSON has no literal for NaN or the infinities; those travel as strings.
///
/// Every NaN parses back as `f64::NAN`, so NaN payload bits do not survive.
mod double {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_sign_positive() {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_str("-Infinity")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid double value: {}", other))),
            },
        }
    }
}
