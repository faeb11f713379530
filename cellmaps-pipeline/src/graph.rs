//! Fixed-topology dependency graph over pipeline stages.
//!
//! The topology is baked in: image download and PPI download are
//! independent roots, PPI embedding follows PPI download, each fold's image
//! embedding follows image download, each fold's co-embedding follows that
//! fold's image embedding plus the shared PPI embedding, and hierarchy
//! generation fans in from every fold's co-embedding. Construction is pure
//! and deterministic; identical fold sets yield identical graphs.

use crate::config::FoldSet;
use crate::stages::StageName;

/// The directed acyclic graph of stage instances for one run.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    order: Vec<StageName>,
    folds: FoldSet,
}

impl DependencyGraph {
    /// Builds the graph for the given fold set.
    #[must_use]
    pub fn new(folds: &FoldSet) -> Self {
        let mut order = vec![
            StageName::ImageDownload,
            StageName::PpiDownload,
            StageName::PpiEmbed,
        ];
        for fold in folds.iter() {
            order.push(StageName::ImageEmbed(fold));
            order.push(StageName::CoEmbed(fold));
        }
        order.push(StageName::Hierarchy);

        Self {
            order,
            folds: folds.clone(),
        }
    }

    /// Returns every stage instance in a valid topological order, roots
    /// first and hierarchy last.
    #[must_use]
    pub fn stages(&self) -> &[StageName] {
        &self.order
    }

    /// Returns the number of stage instances.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.order.len()
    }

    /// Returns the fold set this graph was built from.
    #[must_use]
    pub const fn folds(&self) -> &FoldSet {
        &self.folds
    }

    /// Returns the stages that must complete successfully before `stage`
    /// may start.
    #[must_use]
    pub fn dependencies_of(&self, stage: StageName) -> Vec<StageName> {
        match stage {
            StageName::ImageDownload | StageName::PpiDownload => Vec::new(),
            StageName::PpiEmbed => vec![StageName::PpiDownload],
            StageName::ImageEmbed(_) => vec![StageName::ImageDownload],
            StageName::CoEmbed(fold) => {
                vec![StageName::ImageEmbed(fold), StageName::PpiEmbed]
            }
            StageName::Hierarchy => self.folds.iter().map(StageName::CoEmbed).collect(),
        }
    }
}
