use log::info;
use std::path::Path;

use crate::data_types::dataset::RemoteFile;
use crate::data_types::path_set::PathSet;
use crate::data_types::run_config::MODEL_CKPT_NAME;
use crate::errors::PipelineError;
use crate::exec::{run_expecting_success, CommandRunner, Invocation};

/// Connections and segments per file for aria2c
pub const DOWNLOAD_CONNECTIONS: usize = 10;
/// The three files that make up a TensorFlow checkpoint
pub const MODEL_SUFFIXES: [&str; 3] = ["data-00000-of-00001", "index", "meta"];

/// Where a customized model lives, which decides how we copy it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelSource {
    Gcs,
    Http,
    Local
}

impl ModelSource {
    pub fn classify(location: &str) -> Self {
        if location.starts_with("gs://") {
            ModelSource::Gcs
        } else if location.starts_with("http://") || location.starts_with("https://") {
            ModelSource::Http
        } else {
            ModelSource::Local
        }
    }
}

/// Resumable, multi-connection download of one file into `dest_dir`
pub fn aria2c_invocation(url: &str, dest_dir: &Path, name: &str) -> Invocation {
    Invocation::new("aria2c")
        .arg("-c")
        .arg(format!("-x{DOWNLOAD_CONNECTIONS}"))
        .arg(format!("-s{DOWNLOAD_CONNECTIONS}"))
        .arg("--dir").arg(dest_dir.display().to_string())
        .arg("-o").arg(name)
        .arg(url)
}

/// Downloads each file in order, stopping at the first failure.
/// There is no checksum verification after download.
pub fn fetch_datasets<R: CommandRunner + ?Sized>(files: &[RemoteFile], paths: &PathSet, runner: &mut R) -> Result<(), PipelineError> {
    for (i, file) in files.iter().enumerate() {
        info!("Downloading {}/{}: {}", i + 1, files.len(), file.name);
        let inv = aria2c_invocation(&file.url, paths.input_dir(), &file.name);
        run_expecting_success(runner, &inv)
            .map_err(|reason| PipelineError::Transfer { name: file.name.clone(), reason })?;
    }
    Ok(())
}

/// Copies `<location>.{data-00000-of-00001,index,meta}` to `model.ckpt.*` in the input folder
pub fn fetch_customized_model<R: CommandRunner + ?Sized>(location: &str, paths: &PathSet, runner: &mut R) -> Result<(), PipelineError> {
    let source = ModelSource::classify(location);
    info!("Fetching customized model from {location:?} ({source:?})...");
    for suffix in MODEL_SUFFIXES {
        let src = format!("{location}.{suffix}");
        let name = format!("{MODEL_CKPT_NAME}.{suffix}");
        let dest = paths.input_file(&name);
        let transfer_error = |reason: String| PipelineError::Transfer { name: src.clone(), reason };

        match source {
            ModelSource::Gcs => {
                let inv = Invocation::new("gsutil").arg("cp").arg(&src).arg(dest.display().to_string());
                run_expecting_success(runner, &inv).map_err(transfer_error)?;
            },
            ModelSource::Http => {
                let inv = aria2c_invocation(&src, paths.input_dir(), &name);
                run_expecting_success(runner, &inv).map_err(transfer_error)?;
            },
            ModelSource::Local => {
                std::fs::copy(&src, &dest).map_err(|e| transfer_error(e.to_string()))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::mock::MockRunner;

    fn test_files() -> Vec<RemoteFile> {
        ["ref.fasta.gz", "reads.bam", "truth.vcf.gz"].iter()
            .map(|n| RemoteFile { url: format!("https://example.org/data/{n}"), name: n.to_string() })
            .collect()
    }

    #[test]
    fn test_fetch_sequential() {
        let paths = PathSet::new(Path::new("/case"));
        let mut runner = MockRunner::default();
        fetch_datasets(&test_files(), &paths, &mut runner).unwrap();
        assert_eq!(runner.command_lines(), vec![
            "aria2c -c -x10 -s10 --dir /case/input/data -o ref.fasta.gz https://example.org/data/ref.fasta.gz",
            "aria2c -c -x10 -s10 --dir /case/input/data -o reads.bam https://example.org/data/reads.bam",
            "aria2c -c -x10 -s10 --dir /case/input/data -o truth.vcf.gz https://example.org/data/truth.vcf.gz",
        ]);
    }

    #[test]
    fn test_fetch_fail_fast() {
        let paths = PathSet::new(Path::new("/case"));
        let mut runner = MockRunner::default().fail_times("reads.bam", 1);
        let err = fetch_datasets(&test_files(), &paths, &mut runner).unwrap_err();
        match err {
            PipelineError::Transfer { name, .. } => assert_eq!(name, "reads.bam"),
            e => panic!("unexpected error: {e}")
        }
        // nothing after the failed file is attempted
        assert_eq!(runner.invocations.len(), 2);
    }

    #[test]
    fn test_classify() {
        assert_eq!(ModelSource::classify("gs://bucket/model.ckpt"), ModelSource::Gcs);
        assert_eq!(ModelSource::classify("https://host/model.ckpt"), ModelSource::Http);
        assert_eq!(ModelSource::classify("/models/model.ckpt"), ModelSource::Local);
    }

    #[test]
    fn test_fetch_gcs_model() {
        let paths = PathSet::new(Path::new("/case"));
        let mut runner = MockRunner::default();
        fetch_customized_model("gs://bucket/wes/model.ckpt-100", &paths, &mut runner).unwrap();
        assert_eq!(runner.command_lines(), vec![
            "gsutil cp gs://bucket/wes/model.ckpt-100.data-00000-of-00001 /case/input/data/model.ckpt.data-00000-of-00001",
            "gsutil cp gs://bucket/wes/model.ckpt-100.index /case/input/data/model.ckpt.index",
            "gsutil cp gs://bucket/wes/model.ckpt-100.meta /case/input/data/model.ckpt.meta",
        ]);
    }

    #[test]
    fn test_fetch_local_model() {
        let src_dir = tempfile::tempdir().unwrap();
        let base = tempfile::tempdir().unwrap();
        let paths = PathSet::new(base.path());
        std::fs::create_dir_all(paths.input_dir()).unwrap();
        for suffix in MODEL_SUFFIXES {
            std::fs::write(src_dir.path().join(format!("custom.ckpt.{suffix}")), suffix).unwrap();
        }

        let location = src_dir.path().join("custom.ckpt");
        let mut runner = MockRunner::default();
        fetch_customized_model(location.to_str().unwrap(), &paths, &mut runner).unwrap();
        assert!(runner.invocations.is_empty());
        assert_eq!(std::fs::read_to_string(paths.input_file("model.ckpt.index")).unwrap(), "index");
    }
}
