use log::info;
use std::io::Write;
use std::path::Path;

use crate::data_types::dataset::{Dataset, SampleRole, RTG_IMAGE};
use crate::data_types::path_set::{container_input, container_output, PathSet, CONTAINER_INPUT, CONTAINER_OUTPUT};
use crate::errors::PipelineError;
use crate::exec::{CommandRunner, Invocation};
use crate::stages::pipeline::{run_stage, run_timed_stage};
use crate::stages::trio_merge::merged_stem;

pub const PEDIGREE_NAME: &str = "trio.ped";
pub const MENDELIAN_LOG: &str = "mendelian.log";

/// Writes a single-family PED file. Both parents are founders with their sex,
/// the child is recorded as male. Phenotypes are missing.
pub fn write_pedigree(path: &Path, child: &str, father: &str, mother: &str) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "#PED format pedigree")?;
    writeln!(file, "#fam-id/ind-id/pat-id/mat-id: 0=unknown")?;
    writeln!(file, "#sex: 1=male; 2=female; 0=unknown")?;
    writeln!(file, "#phenotype: -9=missing, 0=missing; 1=unaffected; 2=affected")?;
    writeln!(file, "#fam-id ind-id pat-id mat-id sex phen")?;
    writeln!(file, "1 {child} {father} {mother} 1 0")?;
    writeln!(file, "1 {father} 0 0 1 0")?;
    writeln!(file, "1 {mother} 0 0 2 0")?;
    Ok(())
}

fn sdf_name(dataset: &Dataset) -> String {
    let stem = dataset.reference.strip_suffix(".fasta").unwrap_or(&dataset.reference);
    format!("{stem}.sdf")
}

fn rtg_container(paths: &PathSet) -> Invocation {
    Invocation::docker_run(
        RTG_IMAGE,
        &[(paths.input_dir(), CONTAINER_INPUT), (paths.output_dir(), CONTAINER_OUTPUT)],
        false
    )
}

/// `rtg format` converts the uncompressed reference into an SDF folder
pub fn rtg_format_invocation(dataset: &Dataset, paths: &PathSet) -> Invocation {
    rtg_container(paths)
        .arg("format")
        .arg("-o").arg(container_output(&sdf_name(dataset)))
        .arg(container_input(&dataset.reference))
}

/// `rtg mendelian` on the merged trio call set, tee'd to its own log
pub fn rtg_mendelian_invocation(dataset: &Dataset, paths: &PathSet) -> Invocation {
    let stem = merged_stem(dataset);
    let child = dataset.sample(SampleRole::Child).map(|s| s.name.as_str()).unwrap_or("trio");
    rtg_container(paths)
        .arg("mendelian")
        .arg("-i").arg(container_output(&format!("{stem}.vcf.gz")))
        .arg("-o").arg(container_output(&format!("{child}_trio_annotated.output.vcf.gz")))
        .arg(format!("--pedigree={}", container_input(PEDIGREE_NAME)))
        .arg("-t").arg(container_output(&sdf_name(dataset)))
        .tee(paths.log_file(MENDELIAN_LOG))
}

/// Writes the pedigree, formats the reference if needed, and counts Mendelian violations.
/// Requires the uncompressed reference, so it runs after evaluation.
pub fn check_mendelian<R: CommandRunner + ?Sized>(dataset: &Dataset, paths: &PathSet, runner: &mut R) -> Result<(), PipelineError> {
    let name_of = |role: SampleRole| dataset.sample(role)
        .map(|s| s.name.clone())
        .ok_or_else(|| PipelineError::StageExecution {
            stage: "Mendelian check".to_string(),
            status: format!("no {} sample in the dataset", role.as_ref())
        });
    let child = name_of(SampleRole::Child)?;
    let father = name_of(SampleRole::Parent1)?;
    let mother = name_of(SampleRole::Parent2)?;

    let ped_path = paths.input_file(PEDIGREE_NAME);
    info!("Writing pedigree to {ped_path:?}...");
    write_pedigree(&ped_path, &child, &father, &mother)
        .map_err(|e| PipelineError::io(format!("writing {ped_path:?}"), e))?;

    // rtg refuses to overwrite an existing SDF
    let sdf_path = paths.output_file(&sdf_name(dataset));
    if sdf_path.exists() {
        info!("Found existing SDF at {sdf_path:?}, skipping rtg format.");
    } else {
        info!("Formatting reference into {sdf_path:?}...");
        run_stage("rtg format", &rtg_format_invocation(dataset, paths), runner)?;
    }

    info!("Running rtg mendelian...");
    let inv = rtg_mendelian_invocation(dataset, paths);
    run_timed_stage("rtg mendelian", &inv, &paths.log_file(MENDELIAN_LOG), runner)?;
    Ok(())
}
