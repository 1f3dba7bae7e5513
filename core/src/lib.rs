//! The subtrack engine: aggregation, enrichment, baseline diffing, monitor
//! polling and scan history.

pub mod adapter;
pub mod baseline;
pub mod context;
pub mod discovery;
pub mod enrichment;
pub mod history;
pub mod monitor;
pub mod scanner;

pub use context::ReconContext;
pub use discovery::Aggregator;
pub use enrichment::EnrichmentScheduler;
pub use history::HistoryStore;
pub use monitor::{LocalMonitor, MonitorControl, MonitorPoller};
pub use scanner::{Engine, ScanSession};
