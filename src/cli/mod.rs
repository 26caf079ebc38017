/*!
# CLI module
Command line interface functionality that is specific to dv-casestudy.
*/

/// The main CLI module that contains the top-level CLI parser, shared flags and help text
pub mod core;
/// The DeepTrio case study subcommand
pub mod trio;
/// The whole exome case study subcommand
pub mod wes;
