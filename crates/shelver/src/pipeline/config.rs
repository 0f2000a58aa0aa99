use std::path::PathBuf;

use crate::config::Config;
use crate::error::ConfigError;
use crate::pipeline::cutoff::CutoffGuard;

/// Everything the scheduler and processors need for one run.
pub struct PipelineConfig {
    pub root_directory: PathBuf,
    pub batch_size: usize,
    pub worker_count: usize,
    pub cutoff: CutoffGuard,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let day = config
            .cutoff
            .weekday()
            .ok_or_else(|| ConfigError::Validation {
                message: format!("Unknown cutoff.day: '{}'", config.cutoff.day),
            })?;

        Ok(Self {
            root_directory: PathBuf::from(&config.root_directory),
            batch_size: config.batch_size,
            worker_count: config.worker_count,
            cutoff: CutoffGuard::new(day, config.cutoff.hour),
        })
    }
}
