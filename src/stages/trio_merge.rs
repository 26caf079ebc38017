use log::info;
use std::path::PathBuf;

use crate::data_types::dataset::{Dataset, SampleRole, GLNEXUS_IMAGE};
use crate::data_types::image::ImageReference;
use crate::data_types::path_set::{container_output, PathSet, CONTAINER_OUTPUT};
use crate::errors::PipelineError;
use crate::exec::{CommandRunner, Invocation};
use crate::stages::pipeline::run_stage;

/// GLnexus preset tuned for DeepVariant gVCFs
pub const GLNEXUS_CONFIG: &str = "DeepVariant_unfiltered";

/// Name stem of the merged call set, keyed on the child
pub fn merged_stem(dataset: &Dataset) -> String {
    let child = dataset.sample(SampleRole::Child)
        .map(|s| s.name.as_str())
        .unwrap_or("trio");
    format!("{child}_trio_merged")
}

/// Joint genotyping of all gVCFs, BCF goes to stdout which we redirect into the output folder
pub fn glnexus_invocation(dataset: &Dataset, paths: &PathSet) -> Invocation {
    Invocation::docker_run(GLNEXUS_IMAGE, &[(paths.output_dir(), CONTAINER_OUTPUT)], false)
        .arg("/usr/local/bin/glnexus_cli")
        .arg("--config").arg(GLNEXUS_CONFIG)
        .args(dataset.samples.iter().map(|s| container_output(&s.output_gvcf())))
        .stdout_to(paths.output_file(&format!("{}.bcf", merged_stem(dataset))))
}

/// BCF to bgzipped VCF with the bcftools shipped in the DeepTrio image
pub fn bcftools_invocation(dataset: &Dataset, paths: &PathSet, image: &ImageReference) -> Invocation {
    let stem = merged_stem(dataset);
    Invocation::docker_run(image.as_str(), &[(paths.output_dir(), CONTAINER_OUTPUT)], false)
        .arg("bcftools")
        .arg("view")
        .arg("-Oz")
        .arg("-o").arg(container_output(&format!("{stem}.vcf.gz")))
        .arg(container_output(&format!("{stem}.bcf")))
}

/// Merges the three per-sample gVCFs into one VCF and returns its local path
pub fn merge_trio<R: CommandRunner + ?Sized>(dataset: &Dataset, paths: &PathSet, image: &ImageReference, runner: &mut R) -> Result<PathBuf, PipelineError> {
    for (stage, inv) in [
        ("GLnexus", glnexus_invocation(dataset, paths)),
        ("bcftools view", bcftools_invocation(dataset, paths, image))
    ] {
        info!("Running {stage}...");
        run_stage(stage, &inv, runner)?;
    }
    Ok(paths.output_file(&format!("{}.vcf.gz", merged_stem(dataset))))
}
