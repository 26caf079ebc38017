use clap::Args;
use log::info;

use crate::cli::core::{build_run_config, resolve_base_dir, PipelineFlags, AFTER_HELP, FULL_VERSION};
use crate::data_types::run_config::{CaseStudy, RunConfig};
use crate::errors::PipelineError;

#[derive(Args, Clone, Debug, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct TrioSettings {
    #[command(flatten)]
    pub flags: PipelineFlags,

    /// Restrict calling to these regions; an empty value calls everything covered by the reads
    #[clap(long = "regions")]
    #[clap(value_name = "REGION")]
    #[clap(default_value = "chr20")]
    #[clap(help_heading = Some("Pipeline"))]
    pub regions: String,
}

/// Validates the trio settings and resolves them into a run configuration.
/// No side effects happen here.
pub fn check_trio_settings(settings: TrioSettings) -> Result<RunConfig, PipelineError> {
    info!("dv-casestudy version: {:?}", &*FULL_VERSION);
    info!("Sub-command: {}", CaseStudy::Trio);

    let regions = Some(settings.regions.trim().to_string())
        .filter(|r| !r.is_empty());

    // DeepTrio shards on every available core
    let num_shards = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let base_dir = resolve_base_dir(CaseStudy::Trio)?;
    build_run_config(CaseStudy::Trio, &settings.flags, regions, base_dir, num_shards)
}
