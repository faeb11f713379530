//! Top-level pipeline lifecycle.

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::exec::{ExecutionStrategy, InProcessStrategy, SlurmScriptStrategy};
use crate::provenance::TaskMarkers;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Status recorded when the strategy failed before producing an exit
/// code. Distinct from any stage's real exit code.
pub const INCOMPLETE_STATUS: i32 = 99;

/// Resolves the output root, brackets the run with start/finish markers,
/// and delegates the work to the chosen execution strategy.
pub struct PipelineDriver {
    config: PipelineConfig,
    strategy: Arc<dyn ExecutionStrategy>,
}

impl PipelineDriver {
    /// Creates a driver over an explicit strategy.
    #[must_use]
    pub fn new(config: PipelineConfig, strategy: Arc<dyn ExecutionStrategy>) -> Self {
        Self { config, strategy }
    }

    /// Creates a driver that runs the pipeline in-process.
    #[must_use]
    pub fn in_process(config: PipelineConfig) -> Self {
        let strategy = Arc::new(InProcessStrategy::new(config.clone()));
        Self::new(config, strategy)
    }

    /// Creates a driver that only generates SLURM scripts.
    #[must_use]
    pub fn slurm(config: PipelineConfig) -> Self {
        let strategy = Arc::new(SlurmScriptStrategy::new(config.clone()));
        Self::new(config, strategy)
    }

    /// Runs the pipeline and returns its final status code.
    ///
    /// The start marker is written before any stage runs; the matching
    /// finish marker is written exactly once on every exit path. A stage
    /// failure is returned as that stage's nonzero exit code, which is
    /// also what the finish marker records. When the strategy errs before
    /// producing a code, the finish marker records [`INCOMPLETE_STATUS`]
    /// and the error is propagated.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] with the message
    /// `outdir must be set` when no output root is configured, before any
    /// filesystem side effect; otherwise propagates strategy and marker
    /// write failures.
    pub async fn run(&self) -> Result<i32, PipelineError> {
        let outdir = self.config.outdir()?;
        if !outdir.is_dir() {
            debug!(outdir = %outdir.display(), "Creating output root");
            std::fs::create_dir_all(outdir)?;
        }

        let markers = TaskMarkers::new(outdir);
        markers.write_start(&self.config)?;
        info!(run_id = %markers.run_id(), outdir = %outdir.display(), "Pipeline run started");

        let result = match self.strategy.execute().await {
            // A stage failure already carries the run's final status.
            Err(PipelineError::StageFailure { stage, code }) => {
                error!(run_id = %markers.run_id(), %stage, code, "Pipeline stopped at failed stage");
                Ok(code)
            }
            other => other,
        };
        let status = match &result {
            Ok(code) => *code,
            Err(_) => INCOMPLETE_STATUS,
        };
        let finish = markers.write_finish(status);

        match result {
            Ok(code) => {
                finish?;
                info!(run_id = %markers.run_id(), status = code, "Pipeline run finished");
                Ok(code)
            }
            Err(err) => {
                // The strategy error takes precedence; a finish-marker
                // failure on this path is only logged.
                if let Err(marker_err) = finish {
                    error!(%marker_err, "Failed to write finish marker");
                }
                error!(run_id = %markers.run_id(), %err, "Pipeline run did not complete");
                Err(err)
            }
        }
    }
}
