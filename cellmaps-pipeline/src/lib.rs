//! # Cellmaps Pipeline
//!
//! Orchestration and dependency resolution for the cellmaps multi-stage
//! pipeline: image download, PPI download, PPI embedding, per-fold image
//! embedding, per-fold co-embedding, and hierarchy generation.
//!
//! The crate owns the dependency graph between stages and two
//! interchangeable ways of realizing it:
//!
//! - **In-process execution**: stages run immediately, one at a time, in
//!   topological order, short-circuiting on the first nonzero exit code.
//! - **SLURM script generation**: every stage is rendered into a batch job
//!   script, plus a driver script that submits the jobs with dependency
//!   chains matching the graph; nothing is executed locally.
//!
//! Stages whose output directory already exists are skipped, which makes a
//! run resumable against the same output root. Concurrent driver
//! invocations against one output root are not supported.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cellmaps_pipeline::prelude::*;
//!
//! let config = PipelineConfig::new()
//!     .with_outdir("/data/run1")
//!     .with_provenance("/data/provenance.json")
//!     .with_samples("/data/samples.csv")
//!     .with_unique("/data/unique.csv")
//!     .with_fold(FoldSet::new([1, 2])?);
//!
//! let status = PipelineDriver::in_process(config).run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod driver;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod provenance;
pub mod stages;


/// Version of this crate, recorded in the start marker.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{FoldSet, PipelineConfig};
    pub use crate::driver::{PipelineDriver, INCOMPLETE_STATUS};
    pub use crate::errors::PipelineError;
    pub use crate::exec::{
        ExecutionStrategy, InProcessStrategy, SlurmDirectives, SlurmScriptStrategy,
    };
    pub use crate::graph::DependencyGraph;
    pub use crate::provenance::{TaskFinishRecord, TaskMarkers, TaskStartRecord};
    pub use crate::stages::{
        CommandTemplate, Fold, FsWorkerFactory, StageDisposition, StageName, StageWorker,
        WorkerFactory,
    };
}
