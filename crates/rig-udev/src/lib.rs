//! Structured udev rule-file rendering and installation for rig binaries.
//!
//! Turns typed vendor/product ID matches into well-formed `uaccess` rule
//! lines and writes them atomically so repeated provisioning runs leave the
//! rule file byte-identical.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use rig_core::write_text_atomic;

/// Command that asks the device manager to re-read its rule database after a
/// rule file changes.
pub const UDEV_RELOAD_RULES_COMMAND: &str = "sudo udevadm control --reload-rules";

/// One USB device match granting unprivileged access via `TAG+="uaccess"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRule {
    pub vendor_id: String,
    pub product_id: String,
    pub description: String,
}

impl DeviceRule {
    pub fn new(
        vendor_id: impl Into<String>,
        product_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            vendor_id: vendor_id.into(),
            product_id: product_id.into(),
            description: description.into(),
        }
    }

    /// udev matches IDs case-sensitively, so only 4-digit lowercase hex is accepted.
    pub fn validate(&self) -> Result<()> {
        validate_usb_id("vendor_id", &self.vendor_id)?;
        validate_usb_id("product_id", &self.product_id)?;
        if self.description.trim().is_empty() {
            bail!(
                "device rule {}:{} is missing a description",
                self.vendor_id,
                self.product_id
            );
        }
        if self.description.contains('\n') || self.description.contains('\r') {
            bail!(
                "device rule {}:{} description must be a single line",
                self.vendor_id,
                self.product_id
            );
        }
        Ok(())
    }
}

fn validate_usb_id(field: &str, value: &str) -> Result<()> {
    let valid = value.len() == 4
        && value
            .chars()
            .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch));
    if !valid {
        bail!("{field} '{value}' is not a 4-digit lowercase hex USB ID");
    }
    Ok(())
}

/// Renders the rule file body: one comment header and one match line per
/// rule, blank line between entries, trailing newline. Pure function of its
/// inputs, so identical rules always render to identical bytes.
pub fn render_rules_file(rules: &[DeviceRule]) -> Result<String> {
    if rules.is_empty() {
        bail!("cannot render an empty device rule set");
    }

    let mut body = String::new();
    for (index, rule) in rules.iter().enumerate() {
        rule.validate()?;
        if index > 0 {
            body.push('\n');
        }
        body.push_str(&format!("# {}\n", rule.description.trim()));
        body.push_str(&format!(
            "ATTRS{{idVendor}}==\"{}\", ATTRS{{idProduct}}==\"{}\", TAG+=\"uaccess\"\n",
            rule.vendor_id, rule.product_id
        ));
    }
    Ok(body)
}

/// Writes the rendered rule file into `rules_dir` and returns the final path.
pub fn write_rules_file(rules_dir: &Path, file_name: &str, rules: &[DeviceRule]) -> Result<PathBuf> {
    if file_name.trim().is_empty() || file_name.contains(std::path::MAIN_SEPARATOR) {
        bail!("rule file name '{file_name}' must be a bare file name");
    }
    let body = render_rules_file(rules)?;
    let path = rules_dir.join(file_name);
    write_text_atomic(&path, &body)
        .with_context(|| format!("failed to install udev rules at {}", path.display()))?;
    Ok(path)
}
