/*!
# Errors
Typed failure taxonomy for a case study run.
Every variant is fatal: the first error aborts the run and nothing downstream executes.
*/
use clap::error::{ContextKind, ContextValue, ErrorKind};

/// Process exit code for any validation or stage failure.
/// `exitcode` has no generic failure constant, and the case study scripts always exit with 1.
pub const FAILURE: exitcode::ExitCode = 1;

/// Problems with the command line, always detected before any side effect
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("invalid value {value:?} for {flag}")]
    InvalidFlagValue { flag: String, value: String },
    #[error("a value is required for {flag}")]
    MissingValue { flag: String },
    #[error("unrecognized argument: {0}")]
    UnrecognizedArgument(String),
    #[error("{flag} is not supported by the {variant} case study: {reason}")]
    UnsupportedFlag { flag: String, variant: String, reason: String },
    #[error("{0}")]
    Other(String)
}

impl From<&clap::Error> for ArgumentError {
    fn from(err: &clap::Error) -> Self {
        // clap renders the arg as "--flag <VALUE>", we only want the flag itself
        let flag = match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(s)) => s.split_whitespace().next().unwrap_or_default().to_string(),
            _ => String::new()
        };
        let value = match err.get(ContextKind::InvalidValue) {
            Some(ContextValue::String(s)) => s.clone(),
            _ => String::new()
        };

        match err.kind() {
            ErrorKind::InvalidValue |
            ErrorKind::ValueValidation => {
                if value.is_empty() {
                    ArgumentError::MissingValue { flag }
                } else {
                    ArgumentError::InvalidFlagValue { flag, value }
                }
            },
            ErrorKind::UnknownArgument |
            ErrorKind::InvalidSubcommand => ArgumentError::UnrecognizedArgument(flag),
            ErrorKind::NoEquals |
            ErrorKind::TooFewValues |
            ErrorKind::WrongNumberOfValues => ArgumentError::MissingValue { flag },
            kind => ArgumentError::Other(format!("{kind:?}"))
        }
    }
}

/// Everything that can end a run early
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid arguments: {0}")]
    Argument(#[from] ArgumentError),
    #[error("environment setup failed: {0}")]
    EnvironmentSetup(String),
    #[error("transfer of {name} failed: {reason}")]
    Transfer { name: String, reason: String },
    #[error("could not provision image {image} after {attempts} attempt(s): {reason}")]
    ImageProvision { image: String, attempts: usize, reason: String },
    #[error("{stage} exited with {status}")]
    StageExecution { stage: String, status: String },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error
    }
}

impl PipelineError {
    /// Helper for wrapping local filesystem failures
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PipelineError::Io { context: context.into(), source }
    }

    /// All fatal errors map to the same process exit code
    pub fn exit_code(&self) -> exitcode::ExitCode {
        FAILURE
    }
}
