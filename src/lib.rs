
/// Command line interface functionality
pub mod cli;
/// Configuration, dataset and image types shared by the stages
pub mod data_types;
/// Error taxonomy and exit codes
pub mod errors;
/// Launching external commands
pub mod exec;
/// The individual steps of a case study
pub mod stages;
/// Various utility functions that tend to be very generic
pub mod util;
/// Stage sequencing for a full run
pub mod workflow;
