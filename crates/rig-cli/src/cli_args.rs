use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::CliErrorMode;

pub const DEFAULT_UDEV_RULES_DIR: &str = "/etc/udev/rules.d";

#[derive(Debug, Parser)]
#[command(
    name = "rig-provisioner",
    about = "Provisions an embedded ARM development workbench",
    version
)]
pub struct Cli {
    /// TOML plan file to execute instead of the built-in workbench plan.
    #[arg(long, value_name = "FILE")]
    pub plan: Option<PathBuf>,

    /// Whether a failing step halts the run or lets later steps proceed.
    #[arg(long, value_enum, default_value = "fail-fast")]
    pub error_mode: CliErrorMode,

    /// Resolve and log every step without spawning processes or writing files.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Directory that receives generated udev rule files.
    #[arg(long, value_name = "DIR", env = "RIG_UDEV_DIR", default_value = DEFAULT_UDEV_RULES_DIR)]
    pub udev_dir: PathBuf,

    /// Print the run report as JSON after the summary line.
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,
}
