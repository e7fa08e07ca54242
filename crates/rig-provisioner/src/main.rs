//! Provisions an embedded ARM development workbench: cross toolchain,
//! debug/emulation tooling, and unprivileged USB access to the on-board
//! debugger.

mod bootstrap_helpers;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rig_cli::Cli;
use rig_plan::{embedded_workbench_plan, parse_plan_file, Step};
use rig_runner::{execute_plan, RunReport, RunnerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap_helpers::init_tracing();
    let cli = Cli::parse();

    let steps = resolve_steps(&cli)?;
    let config = RunnerConfig {
        error_mode: cli.error_mode,
        dry_run: cli.dry_run,
        udev_dir: cli.udev_dir.clone(),
    };

    let report = execute_plan(&steps, &config).await?;
    if cli.json {
        print_report_json(&report)?;
    }
    if report.failed > 0 {
        bail!(
            "provisioning finished with failures: failed={} succeeded={}",
            report.failed,
            report.succeeded
        );
    }
    Ok(())
}

fn resolve_steps(cli: &Cli) -> Result<Vec<Step>> {
    match &cli.plan {
        Some(path) => parse_plan_file(path),
        None => embedded_workbench_plan(),
    }
}

fn print_report_json(report: &RunReport) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(report).context("failed to render run report as JSON")?;
    println!("{rendered}");
    Ok(())
}
