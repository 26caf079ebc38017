use log::info;

use crate::data_types::path_set::PathSet;
use crate::errors::PipelineError;
use crate::exec::{run_expecting_success, CommandRunner, Invocation};

/// Package providing the `aria2c` downloader
pub const DOWNLOADER_PACKAGE: &str = "aria2";

/// Creates the working folders and makes sure docker and aria2 are installed.
/// Any failure is fatal and nothing is rolled back.
pub fn prepare_environment<R: CommandRunner + ?Sized>(paths: &PathSet, runner: &mut R) -> Result<(), PipelineError> {
    create_working_dirs(paths)?;

    if runtime_available(runner) {
        info!("Found docker, skipping installation.");
    } else {
        info!("Docker not found, installing docker-ce...");
        for step in docker_install_steps() {
            run_expecting_success(runner, &step)
                .map_err(PipelineError::EnvironmentSetup)?;
        }
    }

    info!("Installing {DOWNLOADER_PACKAGE}...");
    run_expecting_success(runner, &apt_install(&[DOWNLOADER_PACKAGE]))
        .map_err(PipelineError::EnvironmentSetup)?;
    Ok(())
}

/// Idempotent, existing folders are fine
pub fn create_working_dirs(paths: &PathSet) -> Result<(), PipelineError> {
    for dir in paths.working_dirs() {
        info!("Creating folder at {dir:?}...");
        std::fs::create_dir_all(dir)
            .map_err(|e| PipelineError::io(format!("creating {dir:?}"), e))?;
    }
    Ok(())
}

/// True if `docker` resolves and runs
fn runtime_available<R: CommandRunner + ?Sized>(runner: &mut R) -> bool {
    matches!(runner.run(&Invocation::new("docker").arg("--version")), Ok(outcome) if outcome.success())
}

fn apt_install(packages: &[&str]) -> Invocation {
    Invocation::new("sudo")
        .args(["apt-get", "-qq", "-y", "install"])
        .args(packages.iter().copied())
}

fn apt_update() -> Invocation {
    Invocation::new("sudo").args(["apt-get", "-qq", "-y", "update"])
}

/// Docker CE from the upstream apt repository, including its signing key
fn docker_install_steps() -> Vec<Invocation> {
    vec![
        apt_update(),
        apt_install(&["apt-transport-https", "ca-certificates", "curl", "gnupg-agent", "software-properties-common"]),
        Invocation::shell("curl -fsSL https://download.docker.com/linux/ubuntu/gpg | sudo apt-key add -"),
        Invocation::shell("sudo add-apt-repository \"deb [arch=amd64] https://download.docker.com/linux/ubuntu $(lsb_release -cs) stable\""),
        apt_update(),
        apt_install(&["docker-ce"])
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::mock::MockRunner;

    #[test]
    fn test_docker_present() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathSet::new(dir.path());
        let mut runner = MockRunner::default();
        prepare_environment(&paths, &mut runner).unwrap();

        for d in paths.working_dirs() {
            assert!(d.is_dir());
        }
        assert_eq!(runner.command_lines(), vec![
            "docker --version",
            "sudo apt-get -qq -y install aria2"
        ]);

        // second pass is a no-op for the folders
        prepare_environment(&paths, &mut runner).unwrap();
    }

    #[test]
    fn test_docker_missing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathSet::new(dir.path());
        let mut runner = MockRunner::default().missing_program("docker");
        prepare_environment(&paths, &mut runner).unwrap();

        assert_eq!(runner.count_matching("apt-key add"), 1);
        assert_eq!(runner.count_matching("add-apt-repository"), 1);
        assert_eq!(runner.count_matching("install docker-ce"), 1);
        assert!(runner.position("install docker-ce").unwrap() < runner.position("install aria2").unwrap());
    }

    #[test]
    fn test_install_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathSet::new(dir.path());
        let mut runner = MockRunner::default()
            .missing_program("docker")
            .fail_times("apt-key", 1);
        let err = prepare_environment(&paths, &mut runner).unwrap_err();
        assert!(matches!(err, PipelineError::EnvironmentSetup(_)));
        assert_eq!(runner.count_matching("docker-ce"), 0);
        assert_eq!(runner.count_matching("aria2"), 0);
    }
}
