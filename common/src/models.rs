//! Data model shared by the engine, the collaborators and the terminal.

pub mod history;
pub mod metadata;
pub mod monitor;
pub mod results;

pub use history::{DomainHistory, HistorySnapshot, HistoryStats, ScanRecord};
pub use metadata::{Health, MetadataRecord, StatusClass};
pub use monitor::{Event, EventKind, MonitorBaseline, PollBatch, PollCursor};
pub use results::ResultSet;
