//! Immediate, strictly sequential execution of the dependency graph.

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::exec::ExecutionStrategy;
use crate::graph::DependencyGraph;
use crate::stages::{FsWorkerFactory, StageDisposition, WorkerFactory};
use async_trait::async_trait;
use tracing::{error, info};

/// Runs every stage in-process, one at a time, in topological order.
///
/// Stages never run concurrently even where the graph would permit it;
/// stage N+1 does not start until stage N's exit code is known and zero.
/// The first nonzero exit code short-circuits the remaining stages and is
/// reported as a [`PipelineError::StageFailure`] labeled with the stage
/// that produced it.
pub struct InProcessStrategy {
    graph: DependencyGraph,
    factory: Box<dyn WorkerFactory>,
}

impl InProcessStrategy {
    /// Creates a strategy over the graph implied by the configuration's
    /// fold set, resolving workers against the filesystem.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let graph = DependencyGraph::new(&config.fold);
        Self {
            graph,
            factory: Box::new(FsWorkerFactory::new(config)),
        }
    }

    /// Creates a strategy with an injected worker factory.
    #[must_use]
    pub fn with_factory(graph: DependencyGraph, factory: Box<dyn WorkerFactory>) -> Self {
        Self { graph, factory }
    }

    /// Returns the dependency graph this strategy walks.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

#[async_trait]
impl ExecutionStrategy for InProcessStrategy {
    async fn execute(&self) -> Result<i32, PipelineError> {
        for stage in self.graph.stages() {
            match self.factory.resolve(*stage)? {
                StageDisposition::Skip => {}
                StageDisposition::Run(worker) => {
                    let code = worker.run().await;
                    if code != 0 {
                        error!(stage = %stage, code, "Stage had nonzero exit code");
                        return Err(PipelineError::StageFailure {
                            stage: *stage,
                            code,
                        });
                    }
                    info!(stage = %stage, "Stage completed");
                }
            }
        }
        Ok(0)
    }
}
