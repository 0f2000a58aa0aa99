pub mod counters;
pub mod pool;
pub mod record;
pub mod source;

pub use counters::{RunCounters, RunSummary};
pub use pool::{partition, process_backlog, Batch, WorkerPool};
pub use record::{DocumentRecord, OutcomeStatus, RelocationOutcome, DOCUMENT_EXTENSION};
pub use source::PendingSource;
