pub mod config;
pub mod db;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod storage;
pub mod worker;

pub use config::{load_config, Config};
pub use error::{ConfigError, Result, ShelverError, StorageError, WorkerError};
pub use pipeline::{CutoffGuard, PipelineConfig, Processor};
pub use storage::FileStorage;
pub use worker::{process_backlog, DocumentRecord, RelocationOutcome, RunSummary};
