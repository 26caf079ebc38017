use std::path::{Path, PathBuf};

/// Mount point for the input folder inside every container
pub const CONTAINER_INPUT: &str = "/input";
/// Mount point for the output folder inside every container
pub const CONTAINER_OUTPUT: &str = "/output";

/// Local folder layout for a run, derived once from the base folder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSet {
    input_dir: PathBuf,
    output_dir: PathBuf,
    log_dir: PathBuf,
    happy_dir: PathBuf
}

impl PathSet {
    pub fn new(base_dir: &Path) -> Self {
        let output_dir = base_dir.join("output");
        PathSet {
            input_dir: base_dir.join("input").join("data"),
            log_dir: output_dir.join("logs"),
            happy_dir: output_dir.join("happy"),
            output_dir
        }
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Where hap.py writes its reports
    pub fn happy_dir(&self) -> &Path {
        &self.happy_dir
    }

    /// The folders that must exist before anything is downloaded
    pub fn working_dirs(&self) -> [&Path; 3] {
        [&self.input_dir, &self.output_dir, &self.log_dir]
    }

    pub fn input_file(&self, name: &str) -> PathBuf {
        self.input_dir.join(name)
    }

    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn log_file(&self, name: &str) -> PathBuf {
        self.log_dir.join(name)
    }
}

/// Path of an input file as seen from inside a container
pub fn container_input(name: &str) -> String {
    format!("{CONTAINER_INPUT}/{name}")
}

/// Path of an output file as seen from inside a container
pub fn container_output(name: &str) -> String {
    format!("{CONTAINER_OUTPUT}/{name}")
}
