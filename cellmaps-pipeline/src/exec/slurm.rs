//! Deferred execution via SLURM job-script generation.
//!
//! This strategy never runs a stage. It renders one job script per stage
//! instance plus a driver script that submits every job with
//! `--dependency=afterok` clauses derived from the dependency graph, then
//! reports success as soon as all scripts are on disk. The actual run
//! happens later, under the batch scheduler.

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::exec::ExecutionStrategy;
use crate::graph::DependencyGraph;
use crate::stages::{CommandTemplate, StageName};
use async_trait::async_trait;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the generated driver script.
pub const SLURM_DRIVER_SCRIPT: &str = "slurm_cellmaps_job.sh";

/// Resource directives written at the top of every job script.
///
/// All values are configuration-with-defaults; partition and account are
/// emitted only when set.
#[derive(Debug, Clone)]
pub struct SlurmDirectives {
    /// Wall-clock limit.
    pub allocated_time: String,
    /// Memory request.
    pub mem: String,
    /// CPU count per task.
    pub cpus_per_task: u32,
    /// Optional partition.
    pub partition: Option<String>,
    /// Optional account.
    pub account: Option<String>,
}

impl Default for SlurmDirectives {
    fn default() -> Self {
        Self {
            allocated_time: "4:00:00".to_string(),
            mem: "32G".to_string(),
            cpus_per_task: 4,
            partition: None,
            account: None,
        }
    }
}

impl SlurmDirectives {
    /// Builds directives from the run configuration.
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            partition: config.slurm_partition.clone(),
            account: config.slurm_account.clone(),
            ..Self::default()
        }
    }

    fn render(&self, job_name: &str, outdir: &Path) -> String {
        let mut out = String::from("#!/bin/bash\n\n");
        let _ = writeln!(out, "#SBATCH --job-name={job_name}");
        let _ = writeln!(out, "#SBATCH --chdir={}", outdir.display());
        out.push_str("#SBATCH --output=%x.%j.out\n");
        if let Some(partition) = &self.partition {
            let _ = writeln!(out, "#SBATCH --partition={partition}");
        }
        if let Some(account) = &self.account {
            let _ = writeln!(out, "#SBATCH --account={account}");
        }
        out.push_str("#SBATCH --ntasks=1\n");
        let _ = writeln!(out, "#SBATCH --cpus-per-task={}", self.cpus_per_task);
        let _ = writeln!(out, "#SBATCH --mem={}", self.mem);
        let _ = writeln!(out, "#SBATCH --time={}", self.allocated_time);
        out.push_str("\necho $SLURM_JOB_ID\necho $HOSTNAME\n");
        out
    }
}

/// Generates SLURM batch files and a wrapper script that submits the
/// whole pipeline with the graph's dependency chains.
pub struct SlurmScriptStrategy {
    graph: DependencyGraph,
    config: PipelineConfig,
    directives: SlurmDirectives,
}

impl SlurmScriptStrategy {
    /// Creates a strategy over the graph implied by the configuration's
    /// fold set.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let graph = DependencyGraph::new(&config.fold);
        let directives = SlurmDirectives::from_config(&config);
        Self {
            graph,
            config,
            directives,
        }
    }

    /// Overrides the default resource directives.
    #[must_use]
    pub fn with_directives(mut self, directives: SlurmDirectives) -> Self {
        self.directives = directives;
        self
    }

    /// Returns the dependency graph this strategy renders.
    #[must_use]
    pub const fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    fn write_script(path: PathBuf, content: &str) -> Result<(), PipelineError> {
        debug!(path = %path.display(), "Writing script");
        std::fs::write(&path, content).map_err(|source| PipelineError::ScriptWrite { path, source })
    }

    /// Writes the job script for one stage and returns its file name.
    fn generate_job_script(&self, stage: StageName, outdir: &Path) -> Result<String, PipelineError> {
        let template = CommandTemplate::for_stage(stage, &self.config)?;
        let mut content = self.directives.render(&stage.job_name(), outdir);
        content.push_str(&template.shell_line());
        content.push_str("\nexit $?\n");

        let file_name = stage.job_script_name();
        Self::write_script(outdir.join(&file_name), &content)?;
        Ok(file_name)
    }

    /// Returns the upstream job-id variables a stage's submission must
    /// wait on.
    fn submission_dependencies(&self, stage: StageName) -> Vec<String> {
        let mut deps: Vec<StageName> = self.graph.dependencies_of(stage);
        if stage == StageName::Hierarchy {
            // The hierarchy fan-in also waits on the shared PPI embedding
            // job in addition to every fold's co-embedding job.
            deps.insert(0, StageName::PpiEmbed);
        }
        deps.iter().map(|d| format!("${}", d.job_variable())).collect()
    }

    /// Writes every job script plus the driver script.
    fn generate(&self) -> Result<(), PipelineError> {
        let outdir = self.config.outdir()?.to_path_buf();

        let mut driver = String::from("#! /bin/bash\n\n");
        for stage in self.graph.stages() {
            let job_script = self.generate_job_script(*stage, &outdir)?;
            let deps = self.submission_dependencies(*stage);

            if deps.is_empty() {
                let _ = writeln!(driver, "# {stage} no dependencies");
                let _ = writeln!(
                    driver,
                    "{}=$(sbatch {job_script})\n",
                    stage.job_variable()
                );
            } else {
                let _ = writeln!(driver, "# {stage}");
                let _ = writeln!(
                    driver,
                    "{}=$(sbatch --dependency=afterok:{} {job_script})\n",
                    stage.job_variable(),
                    deps.join(":")
                );
            }
        }

        Self::write_script(outdir.join(SLURM_DRIVER_SCRIPT), &driver)?;
        info!(
            outdir = %outdir.display(),
            jobs = self.graph.stage_count(),
            "Wrote SLURM job scripts and driver script"
        );
        Ok(())
    }
}

#[async_trait]
impl ExecutionStrategy for SlurmScriptStrategy {
    async fn execute(&self) -> Result<i32, PipelineError> {
        self.generate()?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FoldSet;
    use tempfile::TempDir;

    fn config(outdir: &Path, folds: &[u32]) -> PipelineConfig {
        PipelineConfig::new()
            .with_outdir(outdir)
            .with_provenance("/data/prov.json")
            .with_samples("/data/samples.csv")
            .with_unique("/data/unique.csv")
            .with_edgelist("/data/edgelist.tsv")
            .with_baitlist("/data/baitlist.tsv")
            .with_model_path("/data/model.pth")
            .with_fold(FoldSet::new(folds.iter().copied()).unwrap())
    }

    async fn generate(config: PipelineConfig) -> SlurmScriptStrategy {
        let strategy = SlurmScriptStrategy::new(config);
        assert_eq!(strategy.execute().await.unwrap(), 0);
        strategy
    }

    #[tokio::test]
    async fn test_single_fold_emits_six_job_scripts_and_driver() {
        let tmp = TempDir::new().unwrap();
        let strategy = generate(config(tmp.path(), &[1])).await;

        for stage in strategy.graph().stages() {
            assert!(tmp.path().join(stage.job_script_name()).is_file());
        }
        assert_eq!(strategy.graph().stage_count(), 6);
        assert!(tmp.path().join(SLURM_DRIVER_SCRIPT).is_file());
    }

    #[tokio::test]
    async fn test_two_folds_emit_one_script_per_stage_instance() {
        let tmp = TempDir::new().unwrap();
        let strategy = generate(config(tmp.path(), &[1, 2])).await;

        // Six stage kinds; the two fold-parameterized kinds are doubled.
        assert_eq!(strategy.graph().stage_count(), 8);
        let scripts: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".sh") && *name != SLURM_DRIVER_SCRIPT)
            .collect();
        assert_eq!(scripts.len(), 8);
        assert!(scripts.contains(&"imageembedjob2.sh".to_string()));
        assert!(scripts.contains(&"coembeddingjob2.sh".to_string()));
    }

    #[tokio::test]
    async fn test_job_script_contents() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), &[1]);
        cfg.slurm_partition = Some("gpu".to_string());
        cfg.slurm_account = Some("cm4ai".to_string());
        generate(cfg).await;

        let script = std::fs::read_to_string(tmp.path().join("coembeddingjob1.sh")).unwrap();
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH --job-name=coembedding1\n"));
        assert!(script.contains("#SBATCH --output=%x.%j.out\n"));
        assert!(script.contains("#SBATCH --partition=gpu\n"));
        assert!(script.contains("#SBATCH --account=cm4ai\n"));
        assert!(script.contains("#SBATCH --cpus-per-task=4\n"));
        assert!(script.contains("#SBATCH --mem=32G\n"));
        assert!(script.contains("#SBATCH --time=4:00:00\n"));
        assert!(script.contains("cellmaps_coembeddingcmd.py"));
        assert!(script.ends_with("exit $?\n"));
    }

    #[tokio::test]
    async fn test_partition_and_account_omitted_by_default() {
        let tmp = TempDir::new().unwrap();
        generate(config(tmp.path(), &[1])).await;

        let script = std::fs::read_to_string(tmp.path().join("ppiembedjob.sh")).unwrap();
        assert!(!script.contains("--partition"));
        assert!(!script.contains("--account"));
    }

    #[tokio::test]
    async fn test_driver_dependency_chains() {
        let tmp = TempDir::new().unwrap();
        generate(config(tmp.path(), &[1, 2])).await;

        let driver = std::fs::read_to_string(tmp.path().join(SLURM_DRIVER_SCRIPT)).unwrap();

        // Roots submit without a dependency clause.
        assert!(driver.contains("image_download_job=$(sbatch imagedownloadjob.sh)"));
        assert!(driver.contains("ppi_download_job=$(sbatch ppidownloadjob.sh)"));

        assert!(driver.contains(
            "ppi_embed_job=$(sbatch --dependency=afterok:$ppi_download_job ppiembedjob.sh)"
        ));
        assert!(driver.contains(
            "image_embed_job2=$(sbatch --dependency=afterok:$image_download_job imageembedjob2.sh)"
        ));
        assert!(driver.contains(
            "coembed_job1=$(sbatch --dependency=afterok:$image_embed_job1:$ppi_embed_job \
             coembeddingjob1.sh)"
        ));

        // The hierarchy fan-in waits on the shared PPI embedding plus
        // every fold's co-embedding.
        assert!(driver.contains(
            "hierarchy_job=$(sbatch \
             --dependency=afterok:$ppi_embed_job:$coembed_job1:$coembed_job2 hierarchyjob.sh)"
        ));
    }

    #[tokio::test]
    async fn test_missing_inputs_abort_generation() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), &[1]);
        cfg.provenance = None;

        let strategy = SlurmScriptStrategy::new(cfg);
        assert!(matches!(
            strategy.execute().await.unwrap_err(),
            PipelineError::Configuration(_)
        ));
    }
}
