pub mod config;
pub mod cutoff;
pub mod runner;

pub use config::PipelineConfig;
pub use cutoff::CutoffGuard;
pub use runner::Processor;
