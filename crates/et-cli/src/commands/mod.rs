//! CLI subcommand implementations.

pub mod check_path;
pub mod classify;
pub mod run;
pub mod show_config;
pub mod summary;
