use anyhow::{Context, Result};
use tokio::process::Command;

pub(crate) struct ShellOutput {
    pub status: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs one command through the user's shell and waits for it to exit. The
/// child is reaped before this returns, so callers never have two steps in
/// flight.
pub(crate) async fn run_shell_command(command: &str) -> Result<ShellOutput> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "sh".to_string());
    let mut command_builder = Command::new(shell);
    command_builder.arg("-c").arg(command);
    command_builder.kill_on_drop(true);

    let output = command_builder
        .output()
        .await
        .with_context(|| format!("failed to spawn shell for '{command}'"))?;

    Ok(ShellOutput {
        status: output.status.code(),
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

pub(crate) fn truncate_bytes(value: &str, limit: usize) -> String {
    if value.len() <= limit {
        return value.to_string();
    }

    if limit == 0 {
        return "<output truncated>".to_string();
    }

    let mut end = limit.min(value.len());
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }

    let mut output = value[..end].to_string();
    output.push_str("\n<output truncated>");
    output
}
