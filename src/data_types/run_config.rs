use derive_builder::Builder;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::data_types::dataset::{Dataset, BIN_VERSION};
use crate::data_types::image::ImageFamily;
use crate::data_types::path_set::{container_input, PathSet};
use crate::data_types::stage_args::{ExtraArgsList, StageArgs};

/// File prefix used for a customized model checkpoint once it is copied into the input folder
pub const MODEL_CKPT_NAME: &str = "model.ckpt";
/// Shard count used by the exome run
pub const DEFAULT_SHARDS: usize = 64;

/// The pipeline variants we know how to run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, strum_macros::Display, strum_macros::AsRefStr)]
pub enum CaseStudy {
    /// DeepVariant on a whole exome
    #[default]
    #[strum(serialize = "wes")]
    Wes,
    /// DeepTrio on a parent-parent-child trio
    #[strum(serialize = "trio")]
    Trio
}

impl CaseStudy {
    pub fn image_family(&self) -> ImageFamily {
        match self {
            CaseStudy::Wes => ImageFamily::DeepVariant,
            CaseStudy::Trio => ImageFamily::DeepTrio
        }
    }

    pub fn dataset(&self) -> Dataset {
        match self {
            CaseStudy::Wes => Dataset::wes(),
            CaseStudy::Trio => Dataset::trio()
        }
    }

    /// Value passed to `--model_type`
    pub fn model_type(&self) -> &'static str {
        match self {
            CaseStudy::Wes => "WES",
            CaseStudy::Trio => "WGS"
        }
    }

    /// Folder name under `$HOME`
    pub fn base_folder_name(&self) -> &'static str {
        match self {
            CaseStudy::Wes => "exome-case-study",
            CaseStudy::Trio => "deeptrio-case-study"
        }
    }

    /// Name of the tee'd log for the main pipeline run
    pub fn runtime_log_name(&self) -> &'static str {
        match self {
            CaseStudy::Wes => "deepvariant_runtime.log",
            CaseStudy::Trio => "deeptrio_runtime.log"
        }
    }
}

/// Immutable description of a run, resolved once from the command line
#[derive(Builder, Clone, Debug, Serialize)]
#[builder(setter(into))]
pub struct RunConfig {
    /// version of this tool that produced the run
    #[builder(default)]
    version: String,
    #[builder(default)]
    case_study: CaseStudy,
    base_dir: PathBuf,
    #[builder(default)]
    docker_build: bool,
    #[builder(default)]
    use_gpu: bool,
    /// checkpoint prefix, either local or remote
    #[builder(default, setter(into, strip_option))]
    customized_model: Option<String>,
    #[builder(default)]
    make_examples_args: StageArgs,
    #[builder(default)]
    call_variants_args: StageArgs,
    #[builder(default)]
    postprocess_variants_args: StageArgs,
    /// region restriction, trio only
    #[builder(default, setter(into, strip_option))]
    regions: Option<String>,
    #[builder(default = "DEFAULT_SHARDS")]
    num_shards: usize,
    /// release used when pulling images
    #[builder(default = "BIN_VERSION.to_string()")]
    bin_version: String
}

impl RunConfig {
    // mostly getters
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn case_study(&self) -> CaseStudy {
        self.case_study
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn docker_build(&self) -> bool {
        self.docker_build
    }

    pub fn use_gpu(&self) -> bool {
        self.use_gpu
    }

    pub fn customized_model(&self) -> Option<&str> {
        self.customized_model.as_deref()
    }

    pub fn make_examples_args(&self) -> &StageArgs {
        &self.make_examples_args
    }

    pub fn call_variants_args(&self) -> &StageArgs {
        &self.call_variants_args
    }

    pub fn postprocess_variants_args(&self) -> &StageArgs {
        &self.postprocess_variants_args
    }

    pub fn regions(&self) -> Option<&str> {
        self.regions.as_deref()
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    pub fn bin_version(&self) -> &str {
        &self.bin_version
    }

    pub fn path_set(&self) -> PathSet {
        PathSet::new(&self.base_dir)
    }

    /// Arguments forwarded to the pipeline after the fixed ones.
    /// Order is fixed: customized model, make_examples, call_variants, postprocess_variants.
    pub fn extra_args(&self) -> ExtraArgsList {
        let mut extra = ExtraArgsList::default();
        if self.customized_model.is_some() {
            extra.push("--customized_model", container_input(MODEL_CKPT_NAME));
        }
        extra.push_stage("--make_examples_extra_args", &self.make_examples_args);
        extra.push_stage("--call_variants_extra_args", &self.call_variants_args);
        extra.push_stage("--postprocess_variants_extra_args", &self.postprocess_variants_args);
        extra
    }
}
