//! Procflow CLI
//!
//! Library half of the `procflow` binary: configuration file, logging
//! setup and the subcommands, kept out of `main` so they can be tested.

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{render, run_directory, validate, ProcessInput};
pub use config::{CliConfig, OutputConfig};
pub use logging::LogFormat;
