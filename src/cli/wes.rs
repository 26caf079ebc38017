use clap::Args;
use log::info;

use crate::cli::core::{build_run_config, resolve_base_dir, PipelineFlags, AFTER_HELP, FULL_VERSION};
use crate::data_types::run_config::{CaseStudy, RunConfig, DEFAULT_SHARDS};
use crate::errors::{ArgumentError, PipelineError};

#[derive(Args, Clone, Debug, Default)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct WesSettings {
    #[command(flatten)]
    pub flags: PipelineFlags,

    // accepted by the parser only so we can reject it with a clear message
    #[clap(long = "regions")]
    #[clap(value_name = "REGION")]
    #[clap(hide = true)]
    pub regions: Option<String>,
}

/// Validates the exome settings and resolves them into a run configuration.
/// No side effects happen here.
pub fn check_wes_settings(settings: WesSettings) -> Result<RunConfig, PipelineError> {
    info!("dv-casestudy version: {:?}", &*FULL_VERSION);
    info!("Sub-command: {}", CaseStudy::Wes);

    if settings.regions.is_some() {
        return Err(ArgumentError::UnsupportedFlag {
            flag: "--regions".to_string(),
            variant: CaseStudy::Wes.to_string(),
            reason: "the exome capture regions are fixed".to_string()
        }.into());
    }

    let base_dir = resolve_base_dir(CaseStudy::Wes)?;
    build_run_config(CaseStudy::Wes, &settings.flags, None, base_dir, DEFAULT_SHARDS)
}
