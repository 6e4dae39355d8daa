//! matcha library: configuration, dispatch and exit codes of the `matcha`
//! binary.

pub mod app;
pub mod config;
pub mod errors;
pub mod version;
