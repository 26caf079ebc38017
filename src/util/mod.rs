
/// Helper functions for writing JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
/// Shared fixtures for unit tests
#[cfg(test)]
pub mod test_fixtures;
