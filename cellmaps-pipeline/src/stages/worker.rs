//! Stage workers and the run/skip decision.
//!
//! A [`StageWorker`] is an opaque, re-runnable unit of work that reports a
//! bare exit code. Workers are constructed lazily, just before they run,
//! by a [`WorkerFactory`]. The filesystem-backed factory implements the
//! pipeline's idempotency policy: a stage whose output directory already
//! exists is treated as completed and skipped, which makes a whole run
//! safely resumable after a partial failure. Directory existence is the
//! only completion signal consulted; a directory left behind by a crashed
//! stage also counts as done.

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::stages::{CommandTemplate, StageName};
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Exit code reported when a stage executable cannot be launched at all.
const LAUNCH_FAILURE_CODE: i32 = 127;

/// One runnable pipeline stage.
#[async_trait]
pub trait StageWorker: Send + Sync + Debug {
    /// The stage instance this worker is bound to.
    fn stage(&self) -> StageName;

    /// Runs the stage to completion and returns its exit code, zero
    /// meaning success. The code is propagated verbatim; no retries.
    async fn run(&self) -> i32;
}

/// Outcome of resolving a stage before any work is done.
#[derive(Debug)]
pub enum StageDisposition {
    /// Output already present; count the stage as succeeded without
    /// running it.
    Skip,
    /// Output absent; run this worker.
    Run(Box<dyn StageWorker>),
}

/// Constructs workers on demand for an execution strategy.
pub trait WorkerFactory: Send + Sync {
    /// Decides whether `stage` should run, be skipped, or fail before any
    /// work is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when inputs the stage
    /// requires are not configured.
    fn resolve(&self, stage: StageName) -> Result<StageDisposition, PipelineError>;
}

/// Worker that invokes a stage's external command-line tool.
#[derive(Debug)]
pub struct ProcessStageWorker {
    stage: StageName,
    template: CommandTemplate,
}

impl ProcessStageWorker {
    /// Creates a worker around the given command template.
    #[must_use]
    pub const fn new(stage: StageName, template: CommandTemplate) -> Self {
        Self { stage, template }
    }
}

#[async_trait]
impl StageWorker for ProcessStageWorker {
    fn stage(&self) -> StageName {
        self.stage
    }

    async fn run(&self) -> i32 {
        info!(stage = %self.stage, command = %self.template.shell_line(), "Running stage");
        match self.template.to_command().status().await {
            // A None code means the process died on a signal.
            Ok(status) => status.code().unwrap_or(1),
            Err(err) => {
                error!(
                    stage = %self.stage,
                    executable = self.template.executable(),
                    %err,
                    "Failed to launch stage command"
                );
                LAUNCH_FAILURE_CODE
            }
        }
    }
}

/// Worker used in fake mode: creates the stage's output directory and
/// succeeds without doing any stage work.
#[derive(Debug)]
pub struct FakeStageWorker {
    stage: StageName,
    output_dir: PathBuf,
}

impl FakeStageWorker {
    /// Creates a fake worker for the given stage and output directory.
    #[must_use]
    pub const fn new(stage: StageName, output_dir: PathBuf) -> Self {
        Self { stage, output_dir }
    }
}

#[async_trait]
impl StageWorker for FakeStageWorker {
    fn stage(&self) -> StageName {
        self.stage
    }

    async fn run(&self) -> i32 {
        warn!(stage = %self.stage, "Fake worker selected, no real stage work will run");
        match std::fs::create_dir_all(&self.output_dir) {
            Ok(()) => 0,
            Err(err) => {
                error!(stage = %self.stage, %err, "Failed to create fake output directory");
                1
            }
        }
    }
}

/// Filesystem-backed worker factory.
///
/// Skips stages whose output directory already exists and otherwise builds
/// a real or fake worker depending on the configuration's `fake` flag.
#[derive(Debug, Clone)]
pub struct FsWorkerFactory {
    config: PipelineConfig,
}

impl FsWorkerFactory {
    /// Creates a factory over the given configuration.
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

impl WorkerFactory for FsWorkerFactory {
    fn resolve(&self, stage: StageName) -> Result<StageDisposition, PipelineError> {
        let outdir = self.config.outdir()?;
        let output_dir = stage.output_dir(outdir);

        if output_dir.is_dir() {
            warn!(
                stage = %stage,
                dir = %output_dir.display(),
                "Found output dir, assuming we are good. skipping"
            );
            return Ok(StageDisposition::Skip);
        }

        // Input validation happens in both real and fake mode so dry runs
        // surface the same configuration problems a real run would.
        let template = CommandTemplate::for_stage(stage, &self.config)?;
        debug!(stage = %stage, command = %template.shell_line(), "Resolved stage command");

        let worker: Box<dyn StageWorker> = if self.config.fake {
            Box::new(FakeStageWorker::new(stage, output_dir))
        } else {
            Box::new(ProcessStageWorker::new(stage, template))
        };
        Ok(StageDisposition::Run(worker))
    }
}
