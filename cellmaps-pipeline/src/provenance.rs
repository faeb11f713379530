//! Start and finish task markers.
//!
//! Two structured records are written into the output root: one before any
//! stage runs, and exactly one after the run concludes or fails. The
//! records tie a run id to its configuration snapshot and final status so
//! a later inspection of the output root can tell what was attempted and
//! how it ended.

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// File name of the start marker in the output root.
pub const TASK_START_FILE: &str = "task_start.json";
/// File name of the finish marker in the output root.
pub const TASK_FINISH_FILE: &str = "task_finish.json";

/// Record written before any stage runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStartRecord {
    /// Identifier shared by the start and finish records of one run.
    pub run_id: Uuid,
    /// When the run started.
    pub start_time: DateTime<Utc>,
    /// Version of this crate.
    pub version: String,
    /// Snapshot of the resolved input configuration.
    pub configuration: PipelineConfig,
}

/// Record written once after the run concludes or fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFinishRecord {
    /// Identifier shared by the start and finish records of one run.
    pub run_id: Uuid,
    /// Final status code of the run.
    pub status: i32,
    /// When the run ended.
    pub end_time: DateTime<Utc>,
}

/// Writes the paired start/finish markers for one run.
#[derive(Debug)]
pub struct TaskMarkers {
    outdir: PathBuf,
    run_id: Uuid,
    start_time: DateTime<Utc>,
}

impl TaskMarkers {
    /// Creates markers for a run rooted at `outdir`, assigning a fresh
    /// run id.
    #[must_use]
    pub fn new(outdir: impl Into<PathBuf>) -> Self {
        Self {
            outdir: outdir.into(),
            run_id: Uuid::new_v4(),
            start_time: Utc::now(),
        }
    }

    /// Returns this run's identifier.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Writes the start marker with a snapshot of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the record cannot be serialized or
    /// written.
    pub fn write_start(&self, config: &PipelineConfig) -> Result<(), PipelineError> {
        let record = TaskStartRecord {
            run_id: self.run_id,
            start_time: self.start_time,
            version: crate::VERSION.to_string(),
            configuration: config.clone(),
        };
        write_record(&self.outdir.join(TASK_START_FILE), &record)
    }

    /// Writes the finish marker with the run's final status code.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the record cannot be serialized or
    /// written.
    pub fn write_finish(&self, status: i32) -> Result<(), PipelineError> {
        let record = TaskFinishRecord {
            run_id: self.run_id,
            status,
            end_time: Utc::now(),
        };
        write_record(&self.outdir.join(TASK_FINISH_FILE), &record)
    }
}

fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), PipelineError> {
    debug!(path = %path.display(), "Writing task marker");
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markers_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let markers = TaskMarkers::new(tmp.path());
        let config = PipelineConfig::new().with_outdir(tmp.path());

        markers.write_start(&config).unwrap();
        markers.write_finish(5).unwrap();

        let start: TaskStartRecord = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join(TASK_START_FILE)).unwrap(),
        )
        .unwrap();
        let finish: TaskFinishRecord = serde_json::from_str(
            &std::fs::read_to_string(tmp.path().join(TASK_FINISH_FILE)).unwrap(),
        )
        .unwrap();

        assert_eq!(start.run_id, finish.run_id);
        assert_eq!(start.version, crate::VERSION);
        assert_eq!(finish.status, 5);
    }

    #[test]
    fn test_write_to_missing_root_fails() {
        let markers = TaskMarkers::new("/nonexistent/run/root");
        let config = PipelineConfig::new();
        assert!(markers.write_start(&config).is_err());
    }
}
