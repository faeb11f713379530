//! Error types for the cellmaps pipeline orchestrator.
//!
//! The taxonomy distinguishes problems that are fatal before any stage runs
//! (configuration), problems reported by a stage itself (nonzero exit code),
//! and problems writing batch-scheduler scripts.

use crate::stages::StageName;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input is missing or inconsistent. Raised before any stage
    /// runs and always fatal.
    #[error("{0}")]
    Configuration(String),

    /// A stage's `run()` returned a nonzero exit code.
    #[error("stage '{stage}' failed with exit code {code}")]
    StageFailure {
        /// The stage instance that failed.
        stage: StageName,
        /// The nonzero exit code it returned.
        code: i32,
    },

    /// A job script could not be written. Aborts script generation for the
    /// remaining stages.
    #[error("failed to write job script '{path}': {source}")]
    ScriptWrite {
        /// Path of the script being written.
        path: PathBuf,
        /// The underlying filesystem error.
        source: std::io::Error,
    },

    /// An IO error outside of script generation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A provenance marker could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Creates a configuration error from any message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_display() {
        let err = PipelineError::config("outdir must be set");
        assert_eq!(err.to_string(), "outdir must be set");
    }

    #[test]
    fn test_stage_failure_display() {
        let err = PipelineError::StageFailure {
            stage: StageName::PpiEmbed,
            code: 5,
        };
        assert_eq!(
            err.to_string(),
            "stage 'ppi_embedding' failed with exit code 5"
        );
    }
}
