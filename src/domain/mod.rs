//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the typed source payload (`RawPayload`, `GenerationEntry`, `InterchangeEntry`)
//! - the per-cycle records (`GridRecord`, `GenerationRecord`, `InterchangeRecord`)
//! - the store-facing `Point`

pub mod types;

pub use types::*;
