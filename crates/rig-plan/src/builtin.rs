use anyhow::Result;
use rig_udev::{DeviceRule, UDEV_RELOAD_RULES_COMMAND};

use crate::step::{call, device_rules, install, raw_call, Step};

/// Rule file consumed by the device manager for ST-LINK probes.
pub const ST_LINK_RULES_FILE: &str = "70-st-link.rules";

/// ST-LINK debugger matches for the STM32F3DISCOVERY board revisions.
pub fn st_link_device_rules() -> Vec<DeviceRule> {
    vec![
        DeviceRule::new("0483", "3748", "STM32F3DISCOVERY rev A/B - ST-LINK/V2"),
        DeviceRule::new("0483", "374b", "STM32F3DISCOVERY rev C+ - ST-LINK/V2-1"),
    ]
}

/// The built-in workbench plan: cross toolchain, debug/emulation tooling,
/// and unprivileged USB access to the on-board debugger.
pub fn embedded_workbench_plan() -> Result<Vec<Step>> {
    Ok(vec![
        raw_call("curl https://sh.rustup.rs -sSf | sh -s -- -y")
            .with_label("rustup bootstrap"),
        call("rustup target add thumbv7m-none-eabi"),
        call("cargo install cargo-binutils"),
        call("rustup component add llvm-tools-preview"),
        install("gdb-multiarch openocd qemu-system-arm")?,
        device_rules(ST_LINK_RULES_FILE, st_link_device_rules()),
        call(UDEV_RELOAD_RULES_COMMAND).with_label("udev reload"),
    ])
}
