//! Declarative command templates for the external stage CLIs.
//!
//! Each stage implementation ships its own command-line tool with a fixed
//! contract. This module is the single source of truth for those
//! invocations: the in-process strategy turns a template into a spawned
//! process, and the SLURM strategy renders the same template into a job
//! script line. Arguments are kept structural so separator mistakes cannot
//! creep into either rendering.

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::stages::StageName;
use std::path::Path;
use tokio::process::Command;

/// Verbosity flag passed to the embedding and hierarchy commands.
const VERBOSE_FLAG: &str = "-vvvv";

/// One external stage invocation: executable plus ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    executable: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Builds the command for one stage instance from the run
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`] when an input the stage
    /// needs is not configured.
    pub fn for_stage(stage: StageName, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let outdir = config.outdir()?;
        match stage {
            StageName::ImageDownload => Self::image_download(outdir, config),
            StageName::PpiDownload => Self::ppi_download(outdir, config),
            StageName::PpiEmbed => Ok(Self::ppi_embed(outdir, config)),
            StageName::ImageEmbed(fold) => Self::image_embed(outdir, config, fold),
            StageName::CoEmbed(fold) => Ok(Self::coembed(outdir, config, fold)),
            StageName::Hierarchy => Ok(Self::hierarchy(outdir, config)),
        }
    }

    fn image_download(outdir: &Path, config: &PipelineConfig) -> Result<Self, PipelineError> {
        let mut args = vec![path_arg(&StageName::ImageDownload.output_dir(outdir))];
        args.push("--provenance".to_string());
        args.push(path_arg(provenance(config)?));
        args.extend(table_or_sample_args(
            config.cm4ai_image.as_deref(),
            config,
        )?);
        Ok(Self {
            executable: "cellmaps_imagedownloadercmd.py".to_string(),
            args,
        })
    }

    fn ppi_download(outdir: &Path, config: &PipelineConfig) -> Result<Self, PipelineError> {
        if config.cm4ai_apms.is_none() && (config.edgelist.is_none() || config.baitlist.is_none())
        {
            return Err(PipelineError::config(
                "You must provide edgelist and baitlist parameters \
                 when no cm4ai_apms table is given",
            ));
        }
        let mut args = vec![path_arg(&StageName::PpiDownload.output_dir(outdir))];
        args.push("--provenance".to_string());
        args.push(path_arg(provenance(config)?));
        args.extend(table_or_sample_args(config.cm4ai_apms.as_deref(), config)?);
        Ok(Self {
            executable: "cellmaps_ppidownloadercmd.py".to_string(),
            args,
        })
    }

    fn ppi_embed(outdir: &Path, config: &PipelineConfig) -> Self {
        let mut args = vec![path_arg(&StageName::PpiEmbed.output_dir(outdir))];
        args.push("--inputdir".to_string());
        args.push(path_arg(&StageName::PpiDownload.output_dir(outdir)));
        if config.fake {
            args.push("--fake_embedder".to_string());
        }
        args.push(VERBOSE_FLAG.to_string());
        Self {
            executable: "cellmaps_ppi_embeddingcmd.py".to_string(),
            args,
        }
    }

    fn image_embed(
        outdir: &Path,
        config: &PipelineConfig,
        fold: u32,
    ) -> Result<Self, PipelineError> {
        if !config.fake && config.model_path.is_none() {
            return Err(PipelineError::config(
                "You must provide model_path parameter for image embedding",
            ));
        }
        let mut args = vec![path_arg(&StageName::ImageEmbed(fold).output_dir(outdir))];
        args.push("--fold".to_string());
        args.push(fold.to_string());
        args.push("--inputdir".to_string());
        args.push(path_arg(&StageName::ImageDownload.output_dir(outdir)));
        if config.fake {
            args.push("--fake_embedder".to_string());
        }
        args.push(VERBOSE_FLAG.to_string());
        Ok(Self {
            executable: "cellmaps_image_embeddingcmd.py".to_string(),
            args,
        })
    }

    fn coembed(outdir: &Path, config: &PipelineConfig, fold: u32) -> Self {
        let mut args = vec![path_arg(&StageName::CoEmbed(fold).output_dir(outdir))];
        args.push("--ppi_embeddingdir".to_string());
        args.push(path_arg(&StageName::PpiEmbed.output_dir(outdir)));
        args.push("--image_embeddingdir".to_string());
        args.push(path_arg(&StageName::ImageEmbed(fold).output_dir(outdir)));
        if config.fake {
            args.push("--fake_embedding".to_string());
        }
        args.push(VERBOSE_FLAG.to_string());
        Self {
            executable: "cellmaps_coembeddingcmd.py".to_string(),
            args,
        }
    }

    fn hierarchy(outdir: &Path, config: &PipelineConfig) -> Self {
        let mut args = vec![path_arg(&StageName::Hierarchy.output_dir(outdir))];
        args.push("--coembedding_dirs".to_string());
        for fold in config.fold.iter() {
            args.push(path_arg(&StageName::CoEmbed(fold).output_dir(outdir)));
        }
        args.push(VERBOSE_FLAG.to_string());
        Self {
            executable: "cellmaps_generate_hierarchycmd.py".to_string(),
            args,
        }
    }

    /// Returns the executable name.
    #[must_use]
    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Returns the ordered arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Renders the invocation as a single shell line for job scripts.
    #[must_use]
    pub fn shell_line(&self) -> String {
        let mut line = self.executable.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Builds a spawnable process command for the in-process strategy.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.args);
        cmd
    }
}

fn provenance(config: &PipelineConfig) -> Result<&Path, PipelineError> {
    config
        .provenance
        .as_deref()
        .ok_or_else(|| PipelineError::config("You must provide provenance parameter"))
}

/// Produces `--cm4ai_table T` when a combined table is configured, falling
/// back to `--samples S --unique U`.
fn table_or_sample_args(
    cm4ai_table: Option<&Path>,
    config: &PipelineConfig,
) -> Result<Vec<String>, PipelineError> {
    if let Some(table) = cm4ai_table {
        return Ok(vec!["--cm4ai_table".to_string(), path_arg(table)]);
    }
    match (config.samples.as_deref(), config.unique.as_deref()) {
        (Some(samples), Some(unique)) => Ok(vec![
            "--samples".to_string(),
            path_arg(samples),
            "--unique".to_string(),
            path_arg(unique),
        ]),
        _ => Err(PipelineError::config(
            "You must provide cm4ai_table parameter or samples and unique parameters",
        )),
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FoldSet;
    use pretty_assertions::assert_eq;

    fn base_config() -> PipelineConfig {
        PipelineConfig::new()
            .with_outdir("/run")
            .with_provenance("/data/prov.json")
            .with_samples("/data/samples.csv")
            .with_unique("/data/unique.csv")
            .with_edgelist("/data/edgelist.tsv")
            .with_baitlist("/data/baitlist.tsv")
            .with_model_path("/data/model.pth")
    }

    #[test]
    fn test_image_download_with_samples() {
        let cmd = CommandTemplate::for_stage(StageName::ImageDownload, &base_config()).unwrap();
        assert_eq!(
            cmd.shell_line(),
            "cellmaps_imagedownloadercmd.py /run/1.image_download \
             --provenance /data/prov.json \
             --samples /data/samples.csv --unique /data/unique.csv"
        );
    }

    #[test]
    fn test_image_download_prefers_cm4ai_table() {
        let config = base_config().with_cm4ai_image("/data/image_table.tsv");
        let cmd = CommandTemplate::for_stage(StageName::ImageDownload, &config).unwrap();
        assert!(cmd
            .shell_line()
            .contains("--cm4ai_table /data/image_table.tsv"));
        assert!(!cmd.shell_line().contains("--samples"));
    }

    #[test]
    fn test_download_requires_provenance() {
        let mut config = base_config();
        config.provenance = None;
        let err = CommandTemplate::for_stage(StageName::ImageDownload, &config).unwrap_err();
        assert!(err.to_string().contains("provenance"));
    }

    #[test]
    fn test_download_requires_table_or_sample_pair() {
        let mut config = base_config();
        config.samples = None;
        let err = CommandTemplate::for_stage(StageName::ImageDownload, &config).unwrap_err();
        assert!(err.to_string().contains("cm4ai_table"));
    }

    #[test]
    fn test_ppi_download_requires_edge_and_bait_lists() {
        let mut config = base_config();
        config.baitlist = None;
        let err = CommandTemplate::for_stage(StageName::PpiDownload, &config).unwrap_err();
        assert!(err.to_string().contains("baitlist"));
    }

    #[test]
    fn test_ppi_embed_line() {
        let cmd = CommandTemplate::for_stage(StageName::PpiEmbed, &base_config()).unwrap();
        assert_eq!(
            cmd.shell_line(),
            "cellmaps_ppi_embeddingcmd.py /run/2.ppi_embedding \
             --inputdir /run/1.ppi_download -vvvv"
        );
    }

    #[test]
    fn test_image_embed_fake_flag() {
        let config = base_config().with_fake(true);
        let cmd = CommandTemplate::for_stage(StageName::ImageEmbed(2), &config).unwrap();
        assert_eq!(
            cmd.shell_line(),
            "cellmaps_image_embeddingcmd.py /run/2.image_embedding2 \
             --fold 2 --inputdir /run/1.image_download --fake_embedder -vvvv"
        );
    }

    #[test]
    fn test_image_embed_requires_model_when_real() {
        let mut config = base_config();
        config.model_path = None;
        let err = CommandTemplate::for_stage(StageName::ImageEmbed(1), &config).unwrap_err();
        assert!(err.to_string().contains("model_path"));
    }

    #[test]
    fn test_coembed_line() {
        let cmd = CommandTemplate::for_stage(StageName::CoEmbed(1), &base_config()).unwrap();
        assert_eq!(
            cmd.shell_line(),
            "cellmaps_coembeddingcmd.py /run/3.coembedding1 \
             --ppi_embeddingdir /run/2.ppi_embedding \
             --image_embeddingdir /run/2.image_embedding1 -vvvv"
        );
    }

    #[test]
    fn test_hierarchy_lists_every_coembed_dir() {
        let config = base_config().with_fold(FoldSet::new([1, 2]).unwrap());
        let cmd = CommandTemplate::for_stage(StageName::Hierarchy, &config).unwrap();
        assert_eq!(
            cmd.shell_line(),
            "cellmaps_generate_hierarchycmd.py /run/4.hierarchy \
             --coembedding_dirs /run/3.coembedding1 /run/3.coembedding2 -vvvv"
        );
    }
}
