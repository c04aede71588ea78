pub mod assemble;
pub mod config;
pub mod difference;
pub mod run_log;
pub mod stages;
mod orchestrator;
mod session;
mod types;

pub use orchestrator::{run_batch, run_batch_reported, run_scan};
pub use session::ScanSession;
pub use types::{BatchReporter, BatchSummary, ScanOutcome, ScanReport, ScanStage, ScanStatus};
