//! Execution strategies over the dependency graph.
//!
//! Both strategies consume the same [`DependencyGraph`](crate::graph::DependencyGraph):
//! the in-process strategy runs stages immediately and sequentially, while
//! the SLURM strategy only describes the run as batch-scheduler scripts and
//! executes nothing itself.

mod inprocess;
mod slurm;

pub use inprocess::InProcessStrategy;
pub use slurm::{SlurmDirectives, SlurmScriptStrategy, SLURM_DRIVER_SCRIPT};

use crate::errors::PipelineError;
use async_trait::async_trait;

/// A mechanism for realizing the dependency graph.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Carries out (or describes) the whole pipeline and returns its exit
    /// code, zero meaning success.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StageFailure`] when a stage reported a
    /// nonzero exit code, and other [`PipelineError`] variants for
    /// failures that occur before any stage produced a code, such as
    /// configuration problems or script write errors.
    async fn execute(&self) -> Result<i32, PipelineError>;
}
