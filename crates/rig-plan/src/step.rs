use anyhow::{bail, Result};
use rig_udev::DeviceRule;

/// How one provisioning step is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Single-line command run through the shell.
    Shell { command: String },
    /// Command passed to the shell verbatim; multi-line and pipe-chained
    /// text is not normalized.
    RawShell { command: String },
    /// Batch package install expanded into one package-manager invocation.
    PackageInstall { packages: Vec<String> },
    /// Native udev rule-file write; no child process involved.
    DeviceRules {
        file_name: String,
        rules: Vec<DeviceRule>,
    },
}

impl StepKind {
    pub fn mode_label(&self) -> &'static str {
        match self {
            StepKind::Shell { .. } => "shell",
            StepKind::RawShell { .. } => "raw-shell",
            StepKind::PackageInstall { .. } => "package-install",
            StepKind::DeviceRules { .. } => "device-rules",
        }
    }
}

/// One provisioning action. Immutable once built; executed in plan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: String,
    pub kind: StepKind,
    pub allow_failure: bool,
}

impl Step {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn tolerating_failure(mut self) -> Self {
        self.allow_failure = true;
        self
    }
}

/// Builds a shell step; the default label is the leading executable.
pub fn call(command: impl Into<String>) -> Step {
    let command = command.into();
    Step {
        label: leading_executable(&command).unwrap_or_else(|| "shell".to_string()),
        kind: StepKind::Shell { command },
        allow_failure: false,
    }
}

/// Builds a raw shell step for commands the runner must not re-quote.
pub fn raw_call(command: impl Into<String>) -> Step {
    let command = command.into();
    Step {
        label: leading_executable(&command).unwrap_or_else(|| "raw-shell".to_string()),
        kind: StepKind::RawShell { command },
        allow_failure: false,
    }
}

/// Builds a batch package-install step from a whitespace-separated list.
pub fn install(package_list: &str) -> Result<Step> {
    let packages: Vec<String> = package_list
        .split_whitespace()
        .map(ToString::to_string)
        .collect();
    if packages.is_empty() {
        bail!("package install step requires at least one package");
    }
    Ok(Step {
        label: format!("install {}", packages.join(" ")),
        kind: StepKind::PackageInstall { packages },
        allow_failure: false,
    })
}

/// Builds a native device-rule write step.
pub fn device_rules(file_name: impl Into<String>, rules: Vec<DeviceRule>) -> Step {
    let file_name = file_name.into();
    Step {
        label: format!("udev rules {file_name}"),
        kind: StepKind::DeviceRules { file_name, rules },
        allow_failure: false,
    }
}

/// Expands a package list into the platform package manager's batch install.
pub fn package_install_command(packages: &[String]) -> String {
    format!("sudo apt-get install -y {}", packages.join(" "))
}

fn leading_executable(command: &str) -> Option<String> {
    let first_line = command.lines().find(|line| !line.trim().is_empty())?;
    let tokens = shell_words::split(first_line).ok()?;
    for token in tokens {
        if is_shell_assignment(&token) {
            continue;
        }

        return Some(
            std::path::Path::new(&token)
                .file_name()
                .map(|file_name| file_name.to_string_lossy().to_string())
                .unwrap_or(token),
        );
    }
    None
}

fn is_shell_assignment(token: &str) -> bool {
    let Some((name, _value)) = token.split_once('=') else {
        return false;
    };

    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return false;
    }

    chars.all(|ch| ch == '_' || ch.is_ascii_alphanumeric())
}
