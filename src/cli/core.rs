use anyhow::bail;
use clap::{Args, CommandFactory, Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use log::info;
use std::path::{Path, PathBuf};

use crate::cli::trio::TrioSettings;
use crate::cli::wes::WesSettings;
use crate::data_types::run_config::{CaseStudy, RunConfig, RunConfigBuilder, MODEL_CKPT_NAME};
use crate::data_types::stage_args::{parse_stage_args, StageArgs};
use crate::errors::{ArgumentError, PipelineError};
use crate::stages::fetch::{ModelSource, MODEL_SUFFIXES};

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.3.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.3.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2017-{} Google LLC and contributors.
DeepVariant, GLnexus, hap.py and RTG Tools run inside their own containers
and are distributed under their own licenses.", chrono::Utc::now().year());
}

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// dv-casestudy, end to end runs of the DeepVariant case studies.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// DeepVariant on the HG003 whole exome, evaluated with hap.py
    Wes(Box<WesSettings>),
    /// DeepTrio on the HG002/HG003/HG004 trio, merged with GLnexus and checked with RTG Tools
    Trio(Box<TrioSettings>)
}

/// Parses the process arguments, leaving error reporting and exit codes to the caller
pub fn try_get_cli() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

/// Usage line of one case study's subcommand, for errors found after parsing
pub fn subcommand_usage(case_study: CaseStudy) -> String {
    let mut command = Cli::command();
    // propagates the `dv-casestudy <sub>` bin names
    command.build();
    match command.find_subcommand_mut(case_study.to_string()) {
        Some(sub) => sub.render_usage().to_string(),
        None => command.render_usage().to_string()
    }
}

/// Accepts only the literals `true` and `false`
pub fn parse_bool_literal(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("expected \"true\" or \"false\"".to_string())
    }
}

/// Flags shared by every case study
#[derive(Args, Clone, Debug, Default)]
pub struct PipelineFlags {
    /// Build the image from the local source tree instead of pulling it
    #[clap(long = "docker_build")]
    #[clap(value_name = "BOOL")]
    #[clap(default_value = "false")]
    #[clap(action = clap::ArgAction::Set)]
    #[clap(value_parser = parse_bool_literal)]
    #[clap(help_heading = Some("Image"))]
    pub docker_build: bool,

    /// Use the GPU image and pass the GPU through to the container
    #[clap(long = "use_gpu")]
    #[clap(visible_alias = "use_accelerator")]
    #[clap(value_name = "BOOL")]
    #[clap(default_value = "false")]
    #[clap(action = clap::ArgAction::Set)]
    #[clap(value_parser = parse_bool_literal)]
    #[clap(help_heading = Some("Image"))]
    pub use_gpu: bool,

    /// Model checkpoint prefix to use instead of the built-in model (local path, gs:// or https://)
    #[clap(long = "customized_model")]
    #[clap(value_name = "PATH")]
    #[clap(help_heading = Some("Pipeline"))]
    pub customized_model: Option<String>,

    /// Extra flags for make_examples
    #[clap(long = "make_examples_extra_args")]
    #[clap(value_name = "K=V,K=V")]
    #[clap(default_value = "", hide_default_value = true)]
    #[clap(value_parser = parse_stage_args)]
    #[clap(help_heading = Some("Pipeline"))]
    pub make_examples_extra_args: StageArgs,

    /// Extra flags for call_variants
    #[clap(long = "call_variants_extra_args")]
    #[clap(value_name = "K=V,K=V")]
    #[clap(default_value = "", hide_default_value = true)]
    #[clap(value_parser = parse_stage_args)]
    #[clap(help_heading = Some("Pipeline"))]
    pub call_variants_extra_args: StageArgs,

    /// Extra flags for postprocess_variants
    #[clap(long = "postprocess_variants_extra_args")]
    #[clap(value_name = "K=V,K=V")]
    #[clap(default_value = "", hide_default_value = true)]
    #[clap(value_parser = parse_stage_args)]
    #[clap(help_heading = Some("Pipeline"))]
    pub postprocess_variants_extra_args: StageArgs,
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }

    // file exists
    Ok(())
}

/// `$HOME/<case study folder>`, or the working directory if HOME is unset
pub fn resolve_base_dir(case_study: CaseStudy) -> Result<PathBuf, PipelineError> {
    let root = match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home),
        None => std::env::current_dir()
            .map_err(|e| PipelineError::io("resolving the working directory", e))?
    };
    Ok(root.join(case_study.base_folder_name()))
}

/// Validates the shared flags and logs them, then assembles the immutable run configuration
pub fn build_run_config(
    case_study: CaseStudy, flags: &PipelineFlags, regions: Option<String>, base_dir: PathBuf, num_shards: usize
) -> Result<RunConfig, PipelineError> {
    // remote checkpoints are only discovered at download time
    if let Some(model) = flags.customized_model.as_deref() {
        if ModelSource::classify(model) == ModelSource::Local {
            for suffix in MODEL_SUFFIXES {
                let filename = PathBuf::from(format!("{model}.{suffix}"));
                check_required_filename(&filename, "Customized model file")
                    .map_err(|e| ArgumentError::InvalidFlagValue {
                        flag: "--customized_model".to_string(),
                        value: format!("{e:#}")
                    })?;
            }
        }
    }

    info!("Image:");
    info!("\tBuild locally: {}", flags.docker_build);
    info!("\tUse GPU: {}", flags.use_gpu);
    info!("Pipeline:");
    if let Some(model) = flags.customized_model.as_deref() {
        info!("\tCustomized model: {model:?} -> {MODEL_CKPT_NAME}");
    } else {
        info!("\tCustomized model: None");
    }
    info!("\tmake_examples extra args: {:?}", flags.make_examples_extra_args.to_flag_value());
    info!("\tcall_variants extra args: {:?}", flags.call_variants_extra_args.to_flag_value());
    info!("\tpostprocess_variants extra args: {:?}", flags.postprocess_variants_extra_args.to_flag_value());
    info!("\tRegions: {:?}", regions.as_deref().unwrap_or("None"));
    info!("\tShards: {num_shards}");
    info!("Outputs:");
    info!("\tBase folder: {base_dir:?}");

    let mut builder = RunConfigBuilder::default();
    builder
        .version(FULL_VERSION.clone())
        .case_study(case_study)
        .base_dir(base_dir)
        .docker_build(flags.docker_build)
        .use_gpu(flags.use_gpu)
        .make_examples_args(flags.make_examples_extra_args.clone())
        .call_variants_args(flags.call_variants_extra_args.clone())
        .postprocess_variants_args(flags.postprocess_variants_extra_args.clone())
        .num_shards(num_shards);
    if let Some(model) = flags.customized_model.clone() {
        builder.customized_model(model);
    }
    if let Some(regions) = regions {
        builder.regions(regions);
    }
    let config = builder.build()
        .map_err(|e| ArgumentError::Other(format!("could not assemble run settings: {e}")))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("dv-casestudy").chain(args.iter().copied()))
    }

    fn wes_flags(args: &[&str]) -> PipelineFlags {
        match parse(args).unwrap().command {
            Commands::Wes(settings) => settings.flags,
            Commands::Trio(_) => panic!("expected wes")
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_bool_literal() {
        assert_eq!(parse_bool_literal("true"), Ok(true));
        assert_eq!(parse_bool_literal("false"), Ok(false));
        assert!(parse_bool_literal("True").is_err());
        assert!(parse_bool_literal("1").is_err());
        assert!(parse_bool_literal("").is_err());
    }

    #[test]
    fn test_defaults() {
        let flags = wes_flags(&["wes"]);
        assert!(!flags.docker_build);
        assert!(!flags.use_gpu);
        assert!(flags.customized_model.is_none());
        assert!(flags.make_examples_extra_args.is_empty());
    }

    #[test]
    fn test_value_forms() {
        let flags = wes_flags(&["wes", "--docker_build=true", "--use_accelerator", "true"]);
        assert!(flags.docker_build);
        assert!(flags.use_gpu);

        let flags = wes_flags(&["wes", "--make_examples_extra_args", "min_mapping_quality=1,keep_legacy_allele_counter_behavior=true"]);
        assert_eq!(flags.make_examples_extra_args.get("min_mapping_quality"), Some("1"));
    }

    #[test]
    fn test_invalid_bool() {
        let err = parse(&["wes", "--docker_build", "yes"]).err().unwrap();
        assert_eq!(ArgumentError::from(&err), ArgumentError::InvalidFlagValue {
            flag: "--docker_build".to_string(),
            value: "yes".to_string()
        });
        assert!(err.use_stderr());
    }

    #[test]
    fn test_invalid_stage_args() {
        let err = parse(&["wes", "--call_variants_extra_args=batch_size"]).err().unwrap();
        assert!(matches!(ArgumentError::from(&err), ArgumentError::InvalidFlagValue { flag, .. } if flag == "--call_variants_extra_args"));
    }

    #[test]
    fn test_unrecognized() {
        let err = parse(&["wes", "--num_shards", "8"]).err().unwrap();
        assert_eq!(ArgumentError::from(&err), ArgumentError::UnrecognizedArgument("--num_shards".to_string()));

        let err = parse(&["wes", "stray"]).err().unwrap();
        assert_eq!(ArgumentError::from(&err), ArgumentError::UnrecognizedArgument("stray".to_string()));
    }

    #[test]
    fn test_missing_value() {
        let err = parse(&["wes", "--use_gpu"]).err().unwrap();
        assert!(matches!(ArgumentError::from(&err), ArgumentError::MissingValue { .. }));
    }

    #[test]
    fn test_help_is_not_an_error() {
        let err = parse(&["wes", "--help"]).err().unwrap();
        assert!(!err.use_stderr());
    }

    #[test]
    fn test_subcommand_usage() {
        for case_study in [CaseStudy::Wes, CaseStudy::Trio] {
            let usage = subcommand_usage(case_study);
            assert!(usage.contains(&format!("dv-casestudy {case_study}")), "{usage}");
            assert!(!usage.contains("<COMMAND>"), "{usage}");
        }
    }

    #[test]
    fn test_build_run_config_local_model() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("model.ckpt-100");
        let flags = PipelineFlags {
            customized_model: Some(prefix.display().to_string()),
            ..Default::default()
        };

        // nothing there yet
        let err = build_run_config(CaseStudy::Wes, &flags, None, dir.path().to_path_buf(), 64).unwrap_err();
        assert!(matches!(err, PipelineError::Argument(ArgumentError::InvalidFlagValue { .. })));

        for suffix in MODEL_SUFFIXES {
            std::fs::write(format!("{}.{suffix}", prefix.display()), "").unwrap();
        }
        let config = build_run_config(CaseStudy::Wes, &flags, None, dir.path().to_path_buf(), 64).unwrap();
        assert_eq!(config.extra_args().to_args(), vec!["--customized_model", "/input/model.ckpt"]);
        assert_eq!(config.version(), FULL_VERSION.as_str());
    }
}
