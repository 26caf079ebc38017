
/// Fixed remote datasets, container images and file names
pub mod dataset;
/// Image tags and the build/pull decision
pub mod image;
/// Local folder layout
pub mod path_set;
/// Fixed-backoff retry policy
pub mod retry;
/// The resolved, immutable run configuration
pub mod run_config;
/// Typed pass-through arguments for the pipeline stages
pub mod stage_args;
