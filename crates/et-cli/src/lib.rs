//! Edit tracker CLI library.
//!
//! This crate wires the core classifier and session store to stdin events,
//! the system clipboard and the HTTP backend.

mod cli;
pub mod clipboard;
pub mod commands;
mod config;
pub mod tracker;

pub use cli::{Cli, Commands};
pub use config::Config;
