use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use rig_cli::{error_mode_label, CliErrorMode, DEFAULT_UDEV_RULES_DIR};
use rig_core::current_unix_timestamp_ms;
use rig_plan::{package_install_command, Step, StepKind};
use rig_udev::{render_rules_file, write_rules_file};

use crate::shell::{run_shell_command, truncate_bytes};

const MAX_REPORT_OUTPUT_BYTES: usize = 8 * 1024;

/// Runner-level failures that abort a provisioning run.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("step '{label}' exited with status {status}")]
    StepExited { label: String, status: i32 },
    #[error("step '{label}' was terminated before exiting")]
    StepTerminated { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub error_mode: CliErrorMode,
    pub dry_run: bool,
    pub udev_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            error_mode: CliErrorMode::FailFast,
            dry_run: false,
            udev_dir: PathBuf::from(DEFAULT_UDEV_RULES_DIR),
        }
    }
}

/// Outcome of one executed step; output is truncated for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub label: String,
    pub mode: &'static str,
    pub status: Option<i32>,
    pub success: bool,
    pub tolerated: bool,
    pub duration_ms: u64,
    pub stdout: String,
    pub stderr: String,
}

/// Aggregate result of a provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_unix_ms: u64,
    pub total: usize,
    pub executed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub tolerated: usize,
    pub halted_early: bool,
    pub outcomes: Vec<StepOutcome>,
}

struct StepExecution {
    status: Option<i32>,
    success: bool,
    stdout: String,
    stderr: String,
}

/// Executes plan steps in order, one child process at a time. A non-zero
/// exit on a step without `allow_failure` halts the run in fail-fast mode;
/// later steps never start.
pub async fn execute_plan(steps: &[Step], config: &RunnerConfig) -> Result<RunReport> {
    let mut report = RunReport {
        started_unix_ms: current_unix_timestamp_ms(),
        total: steps.len(),
        ..RunReport::default()
    };
    let mut fatal_failure: Option<RunnerError> = None;

    for step in steps {
        report.executed += 1;
        let started = Instant::now();
        info!(
            step = %step.label,
            mode = step.kind.mode_label(),
            dry_run = config.dry_run,
            "step started"
        );

        let execution = match execute_step(step, config).await {
            Ok(execution) => execution,
            Err(error) => StepExecution {
                status: None,
                success: false,
                stdout: String::new(),
                stderr: format!("{error:#}"),
            },
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let tolerated = !execution.success && step.allow_failure;
        report.outcomes.push(StepOutcome {
            label: step.label.clone(),
            mode: step.kind.mode_label(),
            status: execution.status,
            success: execution.success,
            tolerated,
            duration_ms,
            stdout: truncate_bytes(&execution.stdout, MAX_REPORT_OUTPUT_BYTES),
            stderr: truncate_bytes(&execution.stderr, MAX_REPORT_OUTPUT_BYTES),
        });

        if execution.success {
            report.succeeded += 1;
            info!(
                step = %step.label,
                status = ?execution.status,
                duration_ms,
                "step finished"
            );
            continue;
        }

        if tolerated {
            report.tolerated += 1;
            warn!(
                step = %step.label,
                status = ?execution.status,
                duration_ms,
                "step failed; continuing (allow_failure)"
            );
            continue;
        }

        report.failed += 1;
        println!(
            "step error: step={} mode={} status={} stderr={}",
            step.label,
            step.kind.mode_label(),
            execution
                .status
                .map_or_else(|| "none".to_string(), |code| code.to_string()),
            truncate_bytes(execution.stderr.trim(), 512)
        );
        if config.error_mode == CliErrorMode::FailFast {
            report.halted_early = true;
            fatal_failure = Some(match execution.status {
                Some(status) => RunnerError::StepExited {
                    label: step.label.clone(),
                    status,
                },
                None => RunnerError::StepTerminated {
                    label: step.label.clone(),
                },
            });
            break;
        }
    }

    println!(
        "provision summary: mode={} dry_run={} total={} executed={} succeeded={} failed={} tolerated={} halted_early={}",
        error_mode_label(config.error_mode),
        config.dry_run,
        report.total,
        report.executed,
        report.succeeded,
        report.failed,
        report.tolerated,
        report.halted_early
    );

    if let Some(failure) = fatal_failure {
        return Err(anyhow::Error::new(failure).context(format!(
            "provisioning halted after {} of {} steps",
            report.executed, report.total
        )));
    }
    Ok(report)
}

async fn execute_step(step: &Step, config: &RunnerConfig) -> Result<StepExecution> {
    match &step.kind {
        StepKind::Shell { command } | StepKind::RawShell { command } => {
            run_command_step(step, command.clone(), config).await
        }
        StepKind::PackageInstall { packages } => {
            run_command_step(step, package_install_command(packages), config).await
        }
        StepKind::DeviceRules { file_name, rules } => {
            run_device_rules_step(step, file_name, rules, config)
        }
    }
}

async fn run_command_step(
    step: &Step,
    command: String,
    config: &RunnerConfig,
) -> Result<StepExecution> {
    if config.dry_run {
        info!(step = %step.label, command = %command, "dry-run: step resolved");
        return Ok(dry_run_execution());
    }

    let output = run_shell_command(&command).await?;
    Ok(StepExecution {
        status: output.status,
        success: output.success,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

fn run_device_rules_step(
    step: &Step,
    file_name: &str,
    rules: &[rig_udev::DeviceRule],
    config: &RunnerConfig,
) -> Result<StepExecution> {
    if config.dry_run {
        // Still renders so malformed rules surface during a dry run.
        render_rules_file(rules)?;
        info!(step = %step.label, file = %file_name, "dry-run: device rules resolved");
        return Ok(dry_run_execution());
    }

    let path = write_rules_file(&config.udev_dir, file_name, rules)?;
    info!(step = %step.label, path = %path.display(), "device rules installed");
    Ok(StepExecution {
        status: Some(0),
        success: true,
        stdout: format!("wrote {}", path.display()),
        stderr: String::new(),
    })
}

fn dry_run_execution() -> StepExecution {
    StepExecution {
        status: None,
        success: true,
        stdout: String::new(),
        stderr: String::new(),
    }
}
