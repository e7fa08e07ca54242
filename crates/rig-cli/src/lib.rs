//! CLI argument models and validation utilities for rig binaries.
//!
//! Exposes clap-backed flag types plus the error-mode labels shared by the
//! runner and the provisioner entrypoint.

pub mod cli_args;
pub mod cli_types;

pub use cli_args::{Cli, DEFAULT_UDEV_RULES_DIR};
pub use cli_types::*;
