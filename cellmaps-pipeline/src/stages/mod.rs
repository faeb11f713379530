//! Stage identity, naming, and unit-of-work contracts.
//!
//! Every pipeline stage is identified by a [`StageName`] instance. The two
//! embedding stages are fold-parameterized, so one logical stage kind can
//! expand into several instances per run. All filesystem naming for a stage
//! (output directory, job script, SLURM job name) derives deterministically
//! from its name, which guarantees distinct instances never collide.

mod command;
mod worker;

pub use command::CommandTemplate;
pub use worker::{
    FakeStageWorker, FsWorkerFactory, ProcessStageWorker, StageDisposition, StageWorker,
    WorkerFactory,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One independent branch of the image-embedding/co-embedding sub-pipeline.
pub type Fold = u32;

/// Directory name for image download output.
pub const IMAGE_DOWNLOAD_STEP_DIR: &str = "1.image_download";
/// Directory name for PPI download output.
pub const PPI_DOWNLOAD_STEP_DIR: &str = "1.ppi_download";
/// Directory name for PPI embedding output.
pub const PPI_EMBEDDING_STEP_DIR: &str = "2.ppi_embedding";
/// Directory name prefix for per-fold image embedding output.
pub const IMAGE_EMBEDDING_STEP_DIR: &str = "2.image_embedding";
/// Directory name prefix for per-fold co-embedding output.
pub const COEMBEDDING_STEP_DIR: &str = "3.coembedding";
/// Directory name for hierarchy generation output.
pub const HIERARCHY_STEP_DIR: &str = "4.hierarchy";

/// Identifies one stage instance in the pipeline.
///
/// `ImageEmbed` and `CoEmbed` carry the fold they belong to; all other
/// stages are singletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Downloads microscopy images.
    ImageDownload,
    /// Downloads the protein-protein interaction network.
    PpiDownload,
    /// Embeds the PPI network.
    PpiEmbed,
    /// Embeds images for one fold.
    ImageEmbed(Fold),
    /// Co-embeds one fold's image embedding with the PPI embedding.
    CoEmbed(Fold),
    /// Merges all co-embeddings into the final hierarchy.
    Hierarchy,
}

impl StageName {
    /// Returns the name of this stage's output directory under the
    /// pipeline's output root.
    #[must_use]
    pub fn dir_name(&self) -> String {
        match self {
            Self::ImageDownload => IMAGE_DOWNLOAD_STEP_DIR.to_string(),
            Self::PpiDownload => PPI_DOWNLOAD_STEP_DIR.to_string(),
            Self::PpiEmbed => PPI_EMBEDDING_STEP_DIR.to_string(),
            Self::ImageEmbed(fold) => format!("{IMAGE_EMBEDDING_STEP_DIR}{fold}"),
            Self::CoEmbed(fold) => format!("{COEMBEDDING_STEP_DIR}{fold}"),
            Self::Hierarchy => HIERARCHY_STEP_DIR.to_string(),
        }
    }

    /// Returns this stage's output directory resolved against `outdir`.
    #[must_use]
    pub fn output_dir(&self, outdir: &Path) -> PathBuf {
        outdir.join(self.dir_name())
    }

    /// Returns the SLURM job name for this stage.
    #[must_use]
    pub fn job_name(&self) -> String {
        match self {
            Self::ImageDownload => "imagedownload".to_string(),
            Self::PpiDownload => "ppidownload".to_string(),
            Self::PpiEmbed => "ppiembed".to_string(),
            Self::ImageEmbed(fold) => format!("imageembed{fold}"),
            Self::CoEmbed(fold) => format!("coembedding{fold}"),
            Self::Hierarchy => "hierarchy".to_string(),
        }
    }

    /// Returns the job script file name for this stage.
    #[must_use]
    pub fn job_script_name(&self) -> String {
        match self {
            Self::ImageDownload => "imagedownloadjob.sh".to_string(),
            Self::PpiDownload => "ppidownloadjob.sh".to_string(),
            Self::PpiEmbed => "ppiembedjob.sh".to_string(),
            Self::ImageEmbed(fold) => format!("imageembedjob{fold}.sh"),
            Self::CoEmbed(fold) => format!("coembeddingjob{fold}.sh"),
            Self::Hierarchy => "hierarchyjob.sh".to_string(),
        }
    }

    /// Returns the shell variable that holds this stage's submitted job id
    /// in the generated driver script.
    #[must_use]
    pub fn job_variable(&self) -> String {
        match self {
            Self::ImageDownload => "image_download_job".to_string(),
            Self::PpiDownload => "ppi_download_job".to_string(),
            Self::PpiEmbed => "ppi_embed_job".to_string(),
            Self::ImageEmbed(fold) => format!("image_embed_job{fold}"),
            Self::CoEmbed(fold) => format!("coembed_job{fold}"),
            Self::Hierarchy => "hierarchy_job".to_string(),
        }
    }

    /// Returns the fold this stage belongs to, if it is fold-parameterized.
    #[must_use]
    pub const fn fold(&self) -> Option<Fold> {
        match self {
            Self::ImageEmbed(fold) | Self::CoEmbed(fold) => Some(*fold),
            _ => None,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageDownload => write!(f, "image_download"),
            Self::PpiDownload => write!(f, "ppi_download"),
            Self::PpiEmbed => write!(f, "ppi_embedding"),
            Self::ImageEmbed(fold) => write!(f, "image_embedding{fold}"),
            Self::CoEmbed(fold) => write!(f, "coembedding{fold}"),
            Self::Hierarchy => write!(f, "hierarchy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_dir_names_are_distinct() {
        let stages = [
            StageName::ImageDownload,
            StageName::PpiDownload,
            StageName::PpiEmbed,
            StageName::ImageEmbed(1),
            StageName::ImageEmbed(2),
            StageName::CoEmbed(1),
            StageName::CoEmbed(2),
            StageName::Hierarchy,
        ];

        let dirs: HashSet<String> = stages.iter().map(StageName::dir_name).collect();
        assert_eq!(dirs.len(), stages.len());
    }

    #[test]
    fn test_output_dir() {
        let dir = StageName::CoEmbed(2).output_dir(Path::new("/tmp/run"));
        assert_eq!(dir, PathBuf::from("/tmp/run/3.coembedding2"));
    }

    #[test]
    fn test_fold_accessor() {
        assert_eq!(StageName::ImageEmbed(3).fold(), Some(3));
        assert_eq!(StageName::Hierarchy.fold(), None);
    }

    #[test]
    fn test_job_script_names() {
        assert_eq!(StageName::PpiEmbed.job_script_name(), "ppiembedjob.sh");
        assert_eq!(
            StageName::CoEmbed(1).job_script_name(),
            "coembeddingjob1.sh"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(StageName::ImageEmbed(2).to_string(), "image_embedding2");
        assert_eq!(StageName::Hierarchy.to_string(), "hierarchy");
    }
}
