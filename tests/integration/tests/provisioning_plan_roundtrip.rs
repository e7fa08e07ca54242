use std::fs;
use std::path::PathBuf;

use rig_cli::CliErrorMode;
use rig_plan::{call, parse_plan_file};
use rig_runner::{execute_plan, RunnerConfig};
use rig_udev::DeviceRule;

fn write_plan_file(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("plan.toml");
    fs::write(&path, contents).expect("write plan file");
    path
}

fn runner_config(dir: &tempfile::TempDir) -> RunnerConfig {
    RunnerConfig {
        udev_dir: dir.path().join("rules.d"),
        ..RunnerConfig::default()
    }
}

#[tokio::test]
async fn integration_plan_file_executes_end_to_end() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let first_marker = tempdir.path().join("first");
    let second_marker = tempdir.path().join("second");
    let plan_path = write_plan_file(
        &tempdir,
        &format!(
            r#"
[[step]]
label = "first marker"
mode = "shell"
command = "touch {first}"

[[step]]
mode = "raw-shell"
command = "echo one | wc -l > {second}"

[[step]]
mode = "device-rules"
file = "70-st-link.rules"

[[step.rule]]
vendor_id = "0483"
product_id = "3748"
description = "STM32F3DISCOVERY rev A/B - ST-LINK/V2"

[[step.rule]]
vendor_id = "0483"
product_id = "374b"
description = "STM32F3DISCOVERY rev C+ - ST-LINK/V2-1"
"#,
            first = first_marker.display(),
            second = second_marker.display()
        ),
    );

    let steps = parse_plan_file(&plan_path).expect("parse plan");
    let config = runner_config(&tempdir);
    let report = execute_plan(&steps, &config).await.expect("run plan");

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 3);
    assert!(first_marker.exists());
    assert_eq!(
        fs::read_to_string(&second_marker).expect("second marker").trim(),
        "1"
    );

    let rules_path = config.udev_dir.join("70-st-link.rules");
    let body = fs::read_to_string(&rules_path).expect("rules file");
    let match_lines: Vec<&str> = body.lines().filter(|l| l.starts_with("ATTRS")).collect();
    assert_eq!(
        match_lines,
        vec![
            "ATTRS{idVendor}==\"0483\", ATTRS{idProduct}==\"3748\", TAG+=\"uaccess\"",
            "ATTRS{idVendor}==\"0483\", ATTRS{idProduct}==\"374b\", TAG+=\"uaccess\"",
        ]
    );
}

#[tokio::test]
async fn integration_rerunning_a_plan_leaves_rule_file_byte_identical() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let config = runner_config(&tempdir);
    let steps = vec![rig_plan::device_rules(
        "70-st-link.rules",
        vec![
            DeviceRule::new("0483", "3748", "STM32F3DISCOVERY rev A/B - ST-LINK/V2"),
            DeviceRule::new("0483", "374b", "STM32F3DISCOVERY rev C+ - ST-LINK/V2-1"),
        ],
    )];

    execute_plan(&steps, &config).await.expect("first run");
    let first = fs::read(config.udev_dir.join("70-st-link.rules")).expect("first bytes");
    execute_plan(&steps, &config).await.expect("second run");
    let second = fs::read(config.udev_dir.join("70-st-link.rules")).expect("second bytes");

    assert_eq!(first, second);
}

#[tokio::test]
async fn integration_fail_fast_plan_skips_steps_after_the_failure() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let marker = tempdir.path().join("after-failure");
    let steps = vec![
        call("true"),
        call("false"),
        call(format!("touch {}", marker.display())),
    ];

    let error = execute_plan(&steps, &runner_config(&tempdir))
        .await
        .expect_err("plan should halt");

    assert!(format!("{error:#}").contains("exited with status 1"));
    assert!(!marker.exists());
}

#[tokio::test]
async fn integration_continue_on_error_reports_every_failure() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let config = RunnerConfig {
        error_mode: CliErrorMode::ContinueOnError,
        ..runner_config(&tempdir)
    };
    let steps = vec![call("false"), call("exit 3"), call("true")];

    let report = execute_plan(&steps, &config).await.expect("report");

    assert_eq!(report.executed, 3);
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded, 1);
    assert!(!report.halted_early);
}

#[tokio::test]
async fn integration_dry_run_resolves_a_plan_without_side_effects() {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let marker = tempdir.path().join("marker");
    let plan_path = write_plan_file(
        &tempdir,
        &format!(
            r#"
[[step]]
mode = "shell"
command = "touch {marker}"

[[step]]
mode = "package-install"
packages = ["gdb-multiarch", "openocd", "qemu-system-arm"]

[[step]]
mode = "device-rules"
file = "70-st-link.rules"

[[step.rule]]
vendor_id = "0483"
product_id = "3748"
description = "STM32F3DISCOVERY rev A/B - ST-LINK/V2"
"#,
            marker = marker.display()
        ),
    );

    let steps = parse_plan_file(&plan_path).expect("parse plan");
    let config = RunnerConfig {
        dry_run: true,
        ..runner_config(&tempdir)
    };
    let report = execute_plan(&steps, &config).await.expect("dry run");

    assert_eq!(report.succeeded, 3);
    assert!(!marker.exists());
    assert!(!config.udev_dir.exists());
}
