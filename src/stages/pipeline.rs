/*!
# Pipeline runner
Assembles the single `docker run` for DeepVariant or DeepTrio and runs it with timing and a tee'd log.
*/
use log::info;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::data_types::dataset::{Dataset, Sample, SampleRole};
use crate::data_types::image::ImageReference;
use crate::data_types::path_set::{container_input, container_output, PathSet, CONTAINER_INPUT, CONTAINER_OUTPUT};
use crate::data_types::run_config::RunConfig;
use crate::errors::PipelineError;
use crate::exec::{append_timing, CommandRunner, Invocation};

/// Base `docker run` with the input and output folders mounted
pub fn pipeline_container(paths: &PathSet, image: &ImageReference, use_gpu: bool) -> Invocation {
    Invocation::docker_run(
        image.as_str(),
        &[(paths.input_dir(), CONTAINER_INPUT), (paths.output_dir(), CONTAINER_OUTPUT)],
        use_gpu
    )
}

/// `run_deepvariant` on the single exome sample
pub fn deepvariant_invocation(config: &RunConfig, dataset: &Dataset, image: &ImageReference) -> Result<Invocation, PipelineError> {
    let paths = config.path_set();
    let sample = dataset.sample(SampleRole::Single)
        .ok_or_else(|| missing_sample(SampleRole::Single))?;

    let mut inv = pipeline_container(&paths, image, config.use_gpu())
        .arg("/opt/deepvariant/bin/run_deepvariant")
        .arg(format!("--model_type={}", config.case_study().model_type()))
        .arg(format!("--ref={}", container_input(&dataset.reference_gz())))
        .arg(format!("--reads={}", container_input(&sample.reads)));
    if let Some(capture) = dataset.capture_bed.as_deref() {
        inv = inv.arg(format!("--regions={}", container_input(capture)));
    }
    let inv = inv
        .arg(format!("--output_vcf={}", container_output(&sample.output_vcf())))
        .arg(format!("--output_gvcf={}", container_output(&sample.output_gvcf())))
        .arg(format!("--num_shards={}", config.num_shards()))
        .arg(format!("--logging_dir={}", container_output("logs")))
        .args(config.extra_args().to_args())
        .tee(paths.log_file(config.case_study().runtime_log_name()));
    Ok(inv)
}

/// `run_deeptrio` on child + both parents
pub fn deeptrio_invocation(config: &RunConfig, dataset: &Dataset, image: &ImageReference) -> Result<Invocation, PipelineError> {
    let paths = config.path_set();
    let members: Vec<&Sample> = [SampleRole::Child, SampleRole::Parent1, SampleRole::Parent2].into_iter()
        .map(|role| dataset.sample(role).ok_or_else(|| missing_sample(role)))
        .collect::<Result<_, _>>()?;

    let mut inv = pipeline_container(&paths, image, config.use_gpu())
        .arg("/opt/deepvariant/bin/deeptrio/run_deeptrio")
        .arg(format!("--model_type={}", config.case_study().model_type()))
        .arg(format!("--ref={}", container_input(&dataset.reference_gz())));
    for sample in members.iter() {
        inv = inv.arg(format!("--reads_{}={}", sample.role.as_ref(), container_input(&sample.reads)));
    }
    for sample in members.iter() {
        inv = inv.arg(format!("--output_vcf_{}={}", sample.role.as_ref(), container_output(&sample.output_vcf())));
    }
    for sample in members.iter() {
        inv = inv.arg(format!("--output_gvcf_{}={}", sample.role.as_ref(), container_output(&sample.output_gvcf())));
    }
    for sample in members.iter() {
        inv = inv.arg(format!("--sample_name_{}={}", sample.role.as_ref(), sample.name));
    }
    if let Some(regions) = config.regions() {
        inv = inv.arg(format!("--regions={regions}"));
    }
    let inv = inv
        .arg(format!("--num_shards={}", config.num_shards()))
        .arg(format!("--intermediate_results_dir={}", container_output("intermediate_results_dir")))
        .arg(format!("--logging_dir={}", container_output("logs")))
        .args(config.extra_args().to_args())
        .tee(paths.log_file(config.case_study().runtime_log_name()));
    Ok(inv)
}

fn missing_sample(role: SampleRole) -> PipelineError {
    PipelineError::StageExecution {
        stage: "pipeline setup".to_string(),
        status: format!("no {} sample in the dataset", role.as_ref())
    }
}

/// Runs a container stage and turns a launch failure or non-zero exit into a StageExecution error
pub fn run_stage<R: CommandRunner + ?Sized>(stage: &str, invocation: &Invocation, runner: &mut R) -> Result<(), PipelineError> {
    let outcome = runner.run(invocation)
        .map_err(|e| PipelineError::StageExecution { stage: stage.to_string(), status: format!("a launch failure: {e}") })?;
    if !outcome.success() {
        return Err(PipelineError::StageExecution { stage: stage.to_string(), status: outcome.to_string() });
    }
    Ok(())
}

/// Same as [`run_stage`], but also appends the wall clock to the stage log.
/// The timing is recorded even when the stage fails.
pub fn run_timed_stage<R: CommandRunner + ?Sized>(stage: &str, invocation: &Invocation, log_path: &Path, runner: &mut R) -> Result<Duration, PipelineError> {
    let start_time = Instant::now();
    let result = run_stage(stage, invocation, runner);
    let elapsed = start_time.elapsed();

    append_timing(log_path, elapsed)
        .map_err(|e| PipelineError::io(format!("writing timing to {log_path:?}"), e))?;
    info!("{stage} finished in {} seconds.", elapsed.as_secs_f64());

    result.map(|()| elapsed)
}
