//! Inbound transports for OTLP log exports
//!
//! Both adapters hand their payload to the same [`LogReceiver`](crate::receiver::LogReceiver)
//! and only differ in how they acknowledge and report failures.

pub mod grpc;
pub mod http;
