use std::time::Duration;

use crate::exec::{Capture, CommandRunner, ExitOutcome, Invocation};

/// Records every invocation instead of running it.
/// Failures are scripted by substring match on the rendered command line.
#[derive(Debug, Default)]
pub struct MockRunner {
    pub invocations: Vec<Invocation>,
    pub sleeps: Vec<Duration>,
    /// (pattern, remaining failures)
    failures: Vec<(String, usize)>,
    /// programs that behave as if they are not installed
    missing: Vec<String>
}

impl MockRunner {
    /// The next `times` commands containing `pattern` exit with code 1
    pub fn fail_times(mut self, pattern: &str, times: usize) -> Self {
        self.failures.push((pattern.to_string(), times));
        self
    }

    /// Commands running `program` directly fail to spawn
    pub fn missing_program(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.invocations.iter().map(|i| i.command_line()).collect()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.invocations.iter()
            .filter(|i| i.command_line().contains(pattern))
            .count()
    }

    /// Index of the first invocation containing `pattern`
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.invocations.iter().position(|i| i.command_line().contains(pattern))
    }
}

impl CommandRunner for MockRunner {
    fn run(&mut self, invocation: &Invocation) -> std::io::Result<ExitOutcome> {
        self.invocations.push(invocation.clone());
        let line = invocation.command_line();

        if self.missing.iter().any(|m| m == invocation.program()) {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"));
        }

        // leave a trace in any captured output so callers can check the file exists
        match invocation.capture() {
            Capture::Tee(path) |
            Capture::StdoutTo(path) => {
                if path.parent().is_some_and(|p| p.exists()) {
                    std::fs::write(path, format!("{line}\n"))?;
                }
            },
            Capture::Inherit => {}
        }

        for (pattern, remaining) in self.failures.iter_mut() {
            if *remaining > 0 && line.contains(pattern.as_str()) {
                *remaining -= 1;
                return Ok(ExitOutcome::from_code(1));
            }
        }
        Ok(ExitOutcome::from_code(0))
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
