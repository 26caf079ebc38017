/*!
# Workflow
Runs a case study start to finish, one stage after another.
The first error aborts the run; nothing downstream of a failed stage executes.
*/
use log::info;
use std::time::Instant;

use crate::data_types::image::plan_image;
use crate::data_types::run_config::{CaseStudy, RunConfig};
use crate::errors::PipelineError;
use crate::exec::CommandRunner;
use crate::stages::environment::prepare_environment;
use crate::stages::evaluate::evaluate;
use crate::stages::fetch::{fetch_customized_model, fetch_datasets};
use crate::stages::mendelian::check_mendelian;
use crate::stages::pipeline::{deeptrio_invocation, deepvariant_invocation, run_timed_stage};
use crate::stages::provision::provision_image;
use crate::stages::trio_merge::merge_trio;
use crate::util::json_io::save_json;

/// Saved next to the stage logs so a run can be reproduced
pub const SETTINGS_JSON: &str = "run_settings.json";

pub fn run_case_study<R: CommandRunner + ?Sized>(config: &RunConfig, runner: &mut R) -> Result<(), PipelineError> {
    let start_time = Instant::now();
    let case_study = config.case_study();
    let paths = config.path_set();
    let dataset = case_study.dataset();

    info!("Preparing environment...");
    prepare_environment(&paths, runner)?;
    let settings_json = paths.log_file(SETTINGS_JSON);
    info!("Saving run settings to {settings_json:?}...");
    save_json(config, &settings_json)
        .map_err(|e| PipelineError::io("saving run settings", std::io::Error::other(format!("{e:#}"))))?;
    info!("Done.");

    info!("Downloading datasets...");
    fetch_datasets(&dataset.remote_files(), &paths, runner)?;
    if let Some(model) = config.customized_model() {
        fetch_customized_model(model, &paths, runner)?;
    }
    info!("Done.");

    info!("Provisioning {} image...", case_study.image_family());
    let plan = plan_image(case_study.image_family(), config.docker_build(), config.use_gpu(), config.bin_version());
    let image = provision_image(&plan, runner)?;
    info!("Done.");

    info!("Running {} with image {image}...", case_study.image_family());
    let invocation = match case_study {
        CaseStudy::Wes => deepvariant_invocation(config, &dataset, &image)?,
        CaseStudy::Trio => deeptrio_invocation(config, &dataset, &image)?
    };
    let runtime_log = paths.log_file(case_study.runtime_log_name());
    run_timed_stage(&case_study.image_family().to_string(), &invocation, &runtime_log, runner)?;
    info!("Done.");

    if case_study == CaseStudy::Trio {
        info!("Merging trio gVCFs...");
        let merged = merge_trio(&dataset, &paths, &image, runner)?;
        info!("Merged call set: {merged:?}");
        info!("Done.");
    }

    info!("Evaluating with hap.py...");
    evaluate(&dataset, &paths, config.regions(), runner)?;
    info!("Done.");

    if case_study == CaseStudy::Trio {
        info!("Checking Mendelian consistency...");
        check_mendelian(&dataset, &paths, runner)?;
        info!("Done.");
    }

    info!("Case study completed in {} seconds.", start_time.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::path_set::PathSet;
    use crate::data_types::run_config::RunConfigBuilder;
    use crate::exec::mock::MockRunner;
    use crate::util::test_fixtures::write_multi_member_gz;

    /// The mock never downloads anything, so seed the reference that evaluation decompresses
    fn seed_reference(paths: &PathSet, case_study: CaseStudy) {
        std::fs::create_dir_all(paths.input_dir()).unwrap();
        let dataset = case_study.dataset();
        write_multi_member_gz(&paths.input_file(&dataset.reference_gz()), &[">chr20\nACGT\n"]);
    }

    #[test]
    fn test_default_wes_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfigBuilder::default()
            .base_dir(dir.path())
            .build().unwrap();
        let paths = config.path_set();
        seed_reference(&paths, CaseStudy::Wes);

        let mut runner = MockRunner::default();
        run_case_study(&config, &mut runner).unwrap();

        assert_eq!(runner.count_matching("docker pull google/deepvariant:1.5.0"), 1);
        assert_eq!(runner.count_matching("docker build"), 0);
        assert_eq!(runner.count_matching("aria2c"), 9);

        let run_line = &runner.command_lines()[runner.position("run_deepvariant").unwrap()];
        assert!(run_line.ends_with("--logging_dir=/output/logs"));
        assert!(runner.position("run_deepvariant").unwrap() < runner.position("/opt/hap.py/bin/hap.py").unwrap());
        assert!(runner.position("aria2c").unwrap() < runner.position("docker pull").unwrap());

        assert!(paths.log_file("deepvariant_runtime.log").exists());
        assert!(paths.log_file("happy.log").exists());
        assert!(paths.input_file("GRCh38_no_alt_analysis_set.fasta").exists());
        let settings: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(paths.log_file(SETTINGS_JSON)).unwrap()
        ).unwrap();
        assert_eq!(settings["case_study"], "Wes");
        assert_eq!(settings["docker_build"], false);
    }

    #[test]
    fn test_transient_pull_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfigBuilder::default()
            .base_dir(dir.path())
            .build().unwrap();
        seed_reference(&config.path_set(), CaseStudy::Wes);

        let mut runner = MockRunner::default().fail_times("pull google/deepvariant", 1);
        run_case_study(&config, &mut runner).unwrap();
        assert_eq!(runner.count_matching("docker pull google/deepvariant:1.5.0"), 2);
        assert_eq!(runner.sleeps.len(), 1);
        assert_eq!(runner.count_matching("run_deepvariant"), 1);
    }

    #[test]
    fn test_customized_model_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfigBuilder::default()
            .base_dir(dir.path())
            .customized_model("gs://my-bucket/training/model.ckpt-5000")
            .build().unwrap();
        seed_reference(&config.path_set(), CaseStudy::Wes);

        let mut runner = MockRunner::default();
        run_case_study(&config, &mut runner).unwrap();

        let run_pos = runner.position("run_deepvariant").unwrap();
        for suffix in ["data-00000-of-00001", "index", "meta"] {
            let pos = runner.position(&format!("gsutil cp gs://my-bucket/training/model.ckpt-5000.{suffix}")).unwrap();
            assert!(pos < run_pos);
        }
        assert!(runner.command_lines()[run_pos].ends_with("--customized_model /input/model.ckpt"));
    }

    #[test]
    fn test_gpu_build_failure_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfigBuilder::default()
            .base_dir(dir.path())
            .docker_build(true)
            .use_gpu(true)
            .build().unwrap();

        let mut runner = MockRunner::default().fail_times("docker build", 1);
        let err = run_case_study(&config, &mut runner).unwrap_err();
        assert!(matches!(err, PipelineError::ImageProvision { attempts: 1, .. }));
        assert_eq!(runner.count_matching("docker build"), 1);
        assert_eq!(runner.count_matching("run_deepvariant"), 0);
        assert_eq!(runner.count_matching("hap.py"), 0);
    }

    #[test]
    fn test_pipeline_failure_skips_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfigBuilder::default()
            .base_dir(dir.path())
            .build().unwrap();

        let mut runner = MockRunner::default().fail_times("run_deepvariant", 1);
        let err = run_case_study(&config, &mut runner).unwrap_err();
        assert!(matches!(err, PipelineError::StageExecution { .. }));
        assert_eq!(runner.count_matching("hap.py"), 0);
        // the log still carries the timing line
        let log = std::fs::read_to_string(config.path_set().log_file("deepvariant_runtime.log")).unwrap();
        assert!(log.contains("real\t"));
    }

    #[test]
    fn test_trio_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfigBuilder::default()
            .base_dir(dir.path())
            .case_study(CaseStudy::Trio)
            .regions("chr20")
            .build().unwrap();
        seed_reference(&config.path_set(), CaseStudy::Trio);

        let mut runner = MockRunner::default();
        run_case_study(&config, &mut runner).unwrap();

        let order = [
            "docker pull google/deepvariant:deeptrio-1.5.0",
            "run_deeptrio",
            "glnexus_cli",
            "bcftools view",
            "docker pull jmcdani20/hap.py",
            "rtg-tools:3.12.1 mendelian"
        ].map(|p| runner.position(p).unwrap());
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(runner.count_matching("/opt/hap.py/bin/hap.py"), 3);
        // hap.py is limited to the region DeepTrio was run on
        assert_eq!(runner.count_matching("--pass-only -l chr20"), 3);
        assert!(config.path_set().log_file("happy.HG004.log").exists());
        assert!(config.path_set().output_file("HG002_trio_merged.bcf").exists());
    }
}
