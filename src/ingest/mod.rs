//! Payload handling: timestamp normalization, validation, record mapping.
//!
//! Nothing here performs I/O; every function is a pure transformation of its inputs.

pub mod mapper;
pub mod timestamp;
pub mod validate;

pub use mapper::{RecordSet, map_payload, map_records};
pub use timestamp::normalize_timestamp;
pub use validate::{ValidatedPayload, validate_payload, validate_response};
