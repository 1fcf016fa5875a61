//! Decoding of OTLP/protobuf log export payloads

use crate::errors::DecodeError;
use crate::telemetry::ExportRequest;
use opentelemetry_proto::tonic::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use prost::Message;

pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Turns a transport-independent payload into the record model.
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<ExportRequest, DecodeError>;

    /// Content type of the payloads this decoder understands.
    fn content_type(&self) -> &'static str;

    /// Encoded empty acknowledgment in the same encoding.
    fn empty_response(&self) -> Vec<u8>;
}

/// Binary protobuf encoding of `ExportLogsServiceRequest`.
///
/// Unknown field numbers are skipped by prost, so newer producers stay readable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtobufDecoder;

impl Decoder for ProtobufDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<ExportRequest, DecodeError> {
        let request = ExportLogsServiceRequest::decode(bytes)?;
        Ok(ExportRequest::from(request))
    }

    fn content_type(&self) -> &'static str {
        PROTOBUF_CONTENT_TYPE
    }

    fn empty_response(&self) -> Vec<u8> {
        ExportLogsServiceResponse::default().encode_to_vec()
    }
}
