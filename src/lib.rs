//! `grid-ingest` library crate.
//!
//! The binary (`grid-ingest`) is a thin wrapper around this library so that:
//!
//! - the cycle logic is testable without spawning processes or touching the network
//! - source and writer can be swapped for in-memory fakes

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod sink;
pub mod telemetry;
