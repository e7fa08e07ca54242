use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use rig_udev::DeviceRule;

use crate::step::Step;

/// TOML plan file: an ordered list of `[[step]]` tables.
#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(default)]
    step: Vec<PlanFileStep>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanFileStep {
    label: Option<String>,
    mode: PlanFileMode,
    command: Option<String>,
    packages: Option<Vec<String>>,
    file: Option<String>,
    #[serde(default)]
    rule: Vec<DeviceRule>,
    #[serde(default)]
    allow_failure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum PlanFileMode {
    Shell,
    RawShell,
    PackageInstall,
    DeviceRules,
}

/// Parses a plan file into executable steps. All entries are validated here
/// so a malformed plan fails before any step runs.
pub fn parse_plan_file(path: &Path) -> Result<Vec<Step>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan file {}", path.display()))?;
    let plan: PlanFile = toml::from_str(&raw)
        .with_context(|| format!("failed to parse plan file {}", path.display()))?;
    if plan.step.is_empty() {
        bail!("plan file {} defines no steps", path.display());
    }

    let mut steps = Vec::with_capacity(plan.step.len());
    for (index, entry) in plan.step.into_iter().enumerate() {
        let step = build_step(entry)
            .with_context(|| format!("invalid step {} in plan file {}", index + 1, path.display()))?;
        steps.push(step);
    }
    Ok(steps)
}

fn build_step(entry: PlanFileStep) -> Result<Step> {
    let step = match entry.mode {
        PlanFileMode::Shell => crate::step::call(required_command(&entry)?),
        PlanFileMode::RawShell => crate::step::raw_call(required_command(&entry)?),
        PlanFileMode::PackageInstall => {
            if entry.command.is_some() {
                bail!("package-install steps take 'packages', not 'command'");
            }
            let packages = entry
                .packages
                .as_deref()
                .filter(|packages| !packages.is_empty())
                .context("package-install steps require a non-empty 'packages' list")?;
            crate::step::install(&packages.join(" "))?
        }
        PlanFileMode::DeviceRules => {
            if entry.command.is_some() || entry.packages.is_some() {
                bail!("device-rules steps take 'file' and '[[step.rule]]' tables only");
            }
            let file_name = entry
                .file
                .as_deref()
                .filter(|file| !file.trim().is_empty())
                .context("device-rules steps require a 'file' name")?;
            if entry.rule.is_empty() {
                bail!("device-rules steps require at least one [[step.rule]]");
            }
            for rule in &entry.rule {
                rule.validate()?;
            }
            crate::step::device_rules(file_name, entry.rule.clone())
        }
    };

    let step = match entry.label {
        Some(label) if !label.trim().is_empty() => step.with_label(label),
        _ => step,
    };
    Ok(if entry.allow_failure {
        step.tolerating_failure()
    } else {
        step
    })
}

fn required_command(entry: &PlanFileStep) -> Result<String> {
    if entry.packages.is_some() || entry.file.is_some() || !entry.rule.is_empty() {
        bail!(
            "{} steps take a 'command' only",
            match entry.mode {
                PlanFileMode::Shell => "shell",
                _ => "raw-shell",
            }
        );
    }
    entry
        .command
        .as_deref()
        .map(str::trim)
        .filter(|command| !command.is_empty())
        .map(ToString::to_string)
        .with_context(|| "step requires a non-empty 'command'".to_string())
}
