use flate2::read::MultiGzDecoder;
use indicatif::ProgressBar;
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::data_types::dataset::{Dataset, Sample, SampleRole, HAPPY_IMAGE};
use crate::data_types::image::ProvisionPlan;
use crate::data_types::path_set::{container_input, container_output, PathSet, CONTAINER_INPUT, CONTAINER_OUTPUT};
use crate::errors::PipelineError;
use crate::exec::{CommandRunner, Invocation};
use crate::stages::pipeline::run_timed_stage;
use crate::stages::provision::provision_image;
use crate::util::progress_bar::get_byte_progress_style;

/// Decompresses a (b)gzipped FASTA next to the original, which is kept.
/// Writes to a temporary name first so an interrupted run never leaves a truncated reference behind.
pub fn decompress_reference(compressed: &Path, decompressed: &Path) -> Result<u64, PipelineError> {
    let io_context = |action: &str| format!("{action} while decompressing {compressed:?}");

    let file = File::open(compressed)
        .map_err(|e| PipelineError::io(io_context("opening"), e))?;
    let total_bytes = file.metadata()
        .map_err(|e| PipelineError::io(io_context("reading metadata"), e))?
        .len();

    let progress = ProgressBar::new(total_bytes).with_style(get_byte_progress_style());
    let mut reader = MultiGzDecoder::new(BufReader::new(progress.wrap_read(file)));

    let mut tmp_name = decompressed.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);
    let mut writer = BufWriter::new(
        File::create(tmp_path).map_err(|e| PipelineError::io(io_context("creating output"), e))?
    );
    let written = std::io::copy(&mut reader, &mut writer)
        .map_err(|e| PipelineError::io(io_context("copying"), e))?;
    writer.flush()
        .map_err(|e| PipelineError::io(io_context("flushing"), e))?;
    drop(writer);
    progress.finish_and_clear();

    std::fs::rename(tmp_path, decompressed)
        .map_err(|e| PipelineError::io(io_context("renaming output"), e))?;
    Ok(written)
}

/// hap.py for one sample, comparing our calls against the GIAB truth set.
/// `regions` restricts the comparison to the regions the caller was run on.
pub fn happy_invocation(sample: &Sample, dataset: &Dataset, paths: &PathSet, regions: Option<&str>) -> Invocation {
    let mut inv = Invocation::docker_run(
        HAPPY_IMAGE,
        &[(paths.input_dir(), CONTAINER_INPUT), (paths.output_dir(), CONTAINER_OUTPUT)],
        false
    )
        .arg("/opt/hap.py/bin/hap.py")
        .arg(container_input(&sample.truth_vcf))
        .arg(container_output(&sample.output_vcf()))
        .arg("-f").arg(container_input(&sample.truth_bed));
    if let Some(capture) = dataset.capture_bed.as_deref() {
        inv = inv.arg("-T").arg(container_input(capture));
    }
    inv = inv.arg("-r").arg(container_input(&dataset.reference))
        .arg("-o").arg(container_output(&format!("happy/{}.happy.output", sample.name)))
        .arg("--engine=vcfeval")
        .arg("--pass-only");
    if let Some(regions) = regions {
        inv = inv.arg("-l").arg(regions);
    }
    inv.tee(happy_log(sample, paths))
}

/// `happy.log` for a single-sample run, `happy.<sample>.log` for each trio member
pub fn happy_log(sample: &Sample, paths: &PathSet) -> PathBuf {
    match sample.role {
        SampleRole::Single => paths.log_file("happy.log"),
        _ => paths.log_file(&format!("happy.{}.log", sample.name))
    }
}

/// Decompresses the reference, pulls hap.py, and evaluates every sample in the dataset
pub fn evaluate<R: CommandRunner + ?Sized>(
    dataset: &Dataset,
    paths: &PathSet,
    regions: Option<&str>,
    runner: &mut R
) -> Result<(), PipelineError> {
    let compressed = paths.input_file(&dataset.reference_gz());
    let decompressed = paths.input_file(&dataset.reference);
    info!("Decompressing {compressed:?}...");
    let bytes = decompress_reference(&compressed, &decompressed)?;
    info!("Wrote {bytes} bytes to {decompressed:?}");

    std::fs::create_dir_all(paths.happy_dir())
        .map_err(|e| PipelineError::io(format!("creating {:?}", paths.happy_dir()), e))?;

    provision_image(&ProvisionPlan::pull_once(HAPPY_IMAGE), runner)?;

    for sample in dataset.samples.iter() {
        info!("Evaluating {} with hap.py...", sample.name);
        let inv = happy_invocation(sample, dataset, paths, regions);
        run_timed_stage(&format!("hap.py ({})", sample.name), &inv, &happy_log(sample, paths), runner)?;
    }
    Ok(())
}
