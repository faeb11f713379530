//! Pipeline run configuration.
//!
//! [`PipelineConfig`] is a plain data carrier; which inputs are required is
//! decided per stage when the stage is about to run or be rendered into a
//! job script. The whole configuration is serializable so the driver can
//! snapshot it into the start marker.

use crate::errors::PipelineError;
use crate::stages::Fold;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The ordered, de-duplicated, non-empty set of folds for one run.
///
/// The default is the single fold `1`, and a fresh value is produced per
/// call so no run can observe another run's mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldSet(Vec<Fold>);

impl FoldSet {
    /// Creates a fold set from the given folds, preserving first-seen order
    /// and dropping duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] if the input is empty or
    /// contains a non-positive fold.
    pub fn new(folds: impl IntoIterator<Item = Fold>) -> Result<Self, PipelineError> {
        let mut seen = Vec::new();
        for fold in folds {
            if fold == 0 {
                return Err(PipelineError::config("fold values must be positive"));
            }
            if !seen.contains(&fold) {
                seen.push(fold);
            }
        }
        if seen.is_empty() {
            return Err(PipelineError::config("fold set must not be empty"));
        }
        Ok(Self(seen))
    }

    /// Returns the folds in order.
    #[must_use]
    pub fn folds(&self) -> &[Fold] {
        &self.0
    }

    /// Returns the number of folds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a fold set cannot be constructed empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the folds.
    pub fn iter(&self) -> impl Iterator<Item = Fold> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FoldSet {
    fn default() -> Self {
        Self(vec![1])
    }
}

/// Configuration for one pipeline run.
///
/// All inputs are optional at construction time; per-stage validation
/// happens when a stage is resolved. The image and PPI download stages
/// accept either a combined CM4AI table or a samples + unique-gene-list
/// pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Output root for the whole run.
    pub outdir: Option<PathBuf>,
    /// Provenance descriptor consumed by the download stages.
    pub provenance: Option<PathBuf>,
    /// Combined CM4AI AP-MS table for PPI download.
    pub cm4ai_apms: Option<PathBuf>,
    /// Combined CM4AI image table for image download.
    pub cm4ai_image: Option<PathBuf>,
    /// Sample list file, used together with `unique`.
    pub samples: Option<PathBuf>,
    /// Unique gene list file, used together with `samples`.
    pub unique: Option<PathBuf>,
    /// PPI edge list file.
    pub edgelist: Option<PathBuf>,
    /// PPI bait list file.
    pub baitlist: Option<PathBuf>,
    /// Trained image-embedding model path.
    pub model_path: Option<PathBuf>,
    /// Protein-atlas reference file.
    pub proteinatlasxml: Option<PathBuf>,
    /// PPI-similarity cutoffs for hierarchy generation.
    pub ppi_cutoffs: Vec<f64>,
    /// Selects fake/no-op stage workers for dry runs and testing.
    pub fake: bool,
    /// Folds for the fold-parameterized stages.
    pub fold: FoldSet,
    /// SLURM partition for generated job scripts.
    pub slurm_partition: Option<String>,
    /// SLURM account for generated job scripts.
    pub slurm_account: Option<String>,
}

impl PipelineConfig {
    /// Creates a configuration with all inputs unset and the default fold
    /// set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output root.
    #[must_use]
    pub fn with_outdir(mut self, outdir: impl Into<PathBuf>) -> Self {
        self.outdir = Some(outdir.into());
        self
    }

    /// Sets the provenance descriptor.
    #[must_use]
    pub fn with_provenance(mut self, provenance: impl Into<PathBuf>) -> Self {
        self.provenance = Some(provenance.into());
        self
    }

    /// Sets the combined CM4AI AP-MS table.
    #[must_use]
    pub fn with_cm4ai_apms(mut self, table: impl Into<PathBuf>) -> Self {
        self.cm4ai_apms = Some(table.into());
        self
    }

    /// Sets the combined CM4AI image table.
    #[must_use]
    pub fn with_cm4ai_image(mut self, table: impl Into<PathBuf>) -> Self {
        self.cm4ai_image = Some(table.into());
        self
    }

    /// Sets the sample list file.
    #[must_use]
    pub fn with_samples(mut self, samples: impl Into<PathBuf>) -> Self {
        self.samples = Some(samples.into());
        self
    }

    /// Sets the unique gene list file.
    #[must_use]
    pub fn with_unique(mut self, unique: impl Into<PathBuf>) -> Self {
        self.unique = Some(unique.into());
        self
    }

    /// Sets the PPI edge list file.
    #[must_use]
    pub fn with_edgelist(mut self, edgelist: impl Into<PathBuf>) -> Self {
        self.edgelist = Some(edgelist.into());
        self
    }

    /// Sets the PPI bait list file.
    #[must_use]
    pub fn with_baitlist(mut self, baitlist: impl Into<PathBuf>) -> Self {
        self.baitlist = Some(baitlist.into());
        self
    }

    /// Sets the trained embedding model path.
    #[must_use]
    pub fn with_model_path(mut self, model_path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(model_path.into());
        self
    }

    /// Sets the protein-atlas reference file.
    #[must_use]
    pub fn with_proteinatlasxml(mut self, proteinatlasxml: impl Into<PathBuf>) -> Self {
        self.proteinatlasxml = Some(proteinatlasxml.into());
        self
    }

    /// Sets the PPI-similarity cutoffs.
    #[must_use]
    pub fn with_ppi_cutoffs(mut self, cutoffs: Vec<f64>) -> Self {
        self.ppi_cutoffs = cutoffs;
        self
    }

    /// Selects fake stage workers.
    #[must_use]
    pub fn with_fake(mut self, fake: bool) -> Self {
        self.fake = fake;
        self
    }

    /// Sets the fold set.
    #[must_use]
    pub fn with_fold(mut self, fold: FoldSet) -> Self {
        self.fold = fold;
        self
    }

    /// Sets the SLURM partition.
    #[must_use]
    pub fn with_slurm_partition(mut self, partition: impl Into<String>) -> Self {
        self.slurm_partition = Some(partition.into());
        self
    }

    /// Sets the SLURM account.
    #[must_use]
    pub fn with_slurm_account(mut self, account: impl Into<String>) -> Self {
        self.slurm_account = Some(account.into());
        self
    }

    /// Returns the configured output root.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] with the message
    /// `outdir must be set` when no output root was configured.
    pub fn outdir(&self) -> Result<&Path, PipelineError> {
        self.outdir
            .as_deref()
            .ok_or_else(|| PipelineError::config("outdir must be set"))
    }
}
