use derive_builder::Builder;
use log::warn;
use std::fmt::Display;
use std::time::Duration;

use crate::exec::CommandRunner;

/// Fixed-backoff retry policy for flaky external steps such as image pulls.
#[derive(Builder, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// total number of attempts, including the first one
    #[builder(default = "1")]
    max_attempts: usize,
    /// pause between attempts
    #[builder(default = "Duration::ZERO")]
    backoff: Duration
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, backoff: Duration::ZERO }
    }

    pub fn retry_once(backoff: Duration) -> Self {
        Self { max_attempts: 2, backoff }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Runs `op` until it succeeds or the attempts run out, sleeping through the runner between attempts.
    /// Returns the last error if every attempt failed.
    pub fn execute<R, T, E, F>(&self, runner: &mut R, label: &str, mut op: F) -> Result<T, E>
    where
        R: CommandRunner + ?Sized,
        E: Display,
        F: FnMut(&mut R) -> Result<T, E>
    {
        let mut attempt = 1;
        loop {
            match op(&mut *runner) {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.max_attempts => {
                    warn!("{label} failed on attempt {attempt}/{}: {e}", self.max_attempts);
                    warn!("Retrying in {:?}...", self.backoff);
                    runner.sleep(self.backoff);
                    attempt += 1;
                },
                Err(e) => return Err(e)
            }
        }
    }
}
