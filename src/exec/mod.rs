/*!
# External commands
Every side effect outside of the local filesystem goes through a [`CommandRunner`].
The system runner spawns real processes; tests swap in a recording mock.
*/

/// Recording runner used by unit tests
#[cfg(test)]
pub mod mock;
/// Console + log file duplication of a child's output
pub mod tee;

use itertools::Itertools;
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

/// What happens to the output of a command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Capture {
    /// straight to our own stdout/stderr
    #[default]
    Inherit,
    /// stdout and stderr merged, shown on the console and copied into the log file
    Tee(PathBuf),
    /// stdout written to the file, stderr inherited
    StdoutTo(PathBuf)
}

/// A single external command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    capture: Capture
}

impl Invocation {
    pub fn new(program: &str) -> Self {
        Invocation {
            program: program.to_string(),
            ..Default::default()
        }
    }

    /// Shell snippet, for the few install steps that need a pipe or a substitution
    pub fn shell(script: &str) -> Self {
        Invocation::new("sh").arg("-c").arg(script)
    }

    /// `sudo docker`, the container runtime as the case studies invoke it
    pub fn docker() -> Self {
        Invocation::new("sudo").arg("docker")
    }

    /// `docker run` with the given host folders mounted into the container, GPU passthrough if requested
    pub fn docker_run(image: &str, mounts: &[(&Path, &str)], use_gpu: bool) -> Self {
        let mut inv = Invocation::docker().arg("run");
        if use_gpu {
            inv = inv.arg("--gpus").arg("1");
        }
        for (host, container) in mounts.iter() {
            inv = inv.arg("-v").arg(format!("{}:{container}", host.display()));
        }
        inv.arg(image)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn tee(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.capture = Capture::Tee(log_path.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture = Capture::StdoutTo(path.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Program followed by the arguments, space separated
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program).chain(self.args.iter()).join(" ")
    }

    /// Short label for messages: the program and up to two arguments
    fn program_summary(&self) -> String {
        std::iter::once(&self.program).chain(self.args.iter().take(2)).join(" ")
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

/// How an external command ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitOutcome {
    /// None if the process was killed by a signal
    code: Option<i32>
}

impl ExitOutcome {
    pub fn from_code(code: i32) -> Self {
        ExitOutcome { code: Some(code) }
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        ExitOutcome { code: status.code() }
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(c) => write!(f, "exit code {c}"),
            None => write!(f, "a signal")
        }
    }
}

/// Seam between the orchestration logic and the operating system
pub trait CommandRunner {
    /// Runs the command to completion. `Err` means it could not be started or its output could not be handled.
    fn run(&mut self, invocation: &Invocation) -> std::io::Result<ExitOutcome>;

    /// Blocks between retry attempts
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Spawns real processes
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> std::io::Result<ExitOutcome> {
        debug!("Running: {invocation}");
        let mut command = Command::new(invocation.program());
        command.args(invocation.get_args());

        let status = match invocation.capture() {
            Capture::Inherit => command.status()?,
            Capture::StdoutTo(path) => {
                let file = File::create(path)?;
                command.stdout(Stdio::from(file)).status()?
            },
            Capture::Tee(log_path) => tee::run_tee(command, log_path)?
        };
        Ok(status.into())
    }
}

/// Runs a command and collapses every kind of failure into a message.
/// Callers wrap the message in their own error variant.
pub fn run_expecting_success<R: CommandRunner + ?Sized>(runner: &mut R, invocation: &Invocation) -> Result<(), String> {
    match runner.run(invocation) {
        Ok(outcome) if outcome.success() => Ok(()),
        Ok(outcome) => Err(format!("`{}` exited with {outcome}", invocation.program_summary())),
        Err(e) => Err(format!("could not run `{}`: {e}", invocation.program_summary()))
    }
}

/// Appends a `time`-style wall clock line to a log
pub fn append_timing(log_path: &Path, elapsed: Duration) -> std::io::Result<()> {
    let secs = elapsed.as_secs_f64();
    let minutes = (secs / 60.0).floor();
    let mut file = OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(file, "\nreal\t{}m{:.3}s", minutes as u64, secs - minutes * 60.0)
}
