pub mod coverage;
mod error;
pub mod orchestrator;
pub mod transitions;

pub use coverage::{coverage_summary, CoverageSummary, ProviderCoverage};
pub use error::EngineError;
pub use orchestrator::{
    drain, queue_deletion, queue_domain, queue_verification, DrainReport, QueueOptions,
    QueueReport,
};
pub use transitions::{action_for, enqueue_decision, status_after_success, EnqueueDecision};
