//! Shared building blocks for subtrack: hostnames, the scan/monitor data model,
//! the outbound capability traits and the error taxonomy.

pub mod config;
pub mod error;
pub mod hostname;
pub mod macros;
pub mod models;
pub mod ports;

pub use tracing;
