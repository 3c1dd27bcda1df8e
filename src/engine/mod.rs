//! Core engine: the acquire → rank → research → report pipeline.

pub mod classifier;
pub mod pacing;
pub mod report;
pub mod research;
pub mod scanner;

pub use pacing::{FixedDelay, Pacer};
pub use report::ReportBuilder;
pub use research::Researcher;
pub use scanner::{ScanOrchestrator, ScanSettings};
