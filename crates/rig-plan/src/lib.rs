//! Provisioning plan model for rig binaries.
//!
//! Exposes the step value objects, TOML plan-file parsing, and the built-in
//! embedded-workbench plan consumed by the runner and CLI layers.

pub mod builtin;
pub mod plan_file;
pub mod step;

pub use builtin::*;
pub use plan_file::*;
pub use step::*;
