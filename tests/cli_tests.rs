//! Runs the `loopsel` binary end to end.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{tempdir, TempDir};

fn data_file(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

/// Write a copy of the reference `param.json`, edited by `edit`, into a fresh
/// directory.
fn param_file(
    edit: impl FnOnce(&mut serde_json::Map<String, serde_json::Value>),
) -> (TempDir, PathBuf) {
    let text = std::fs::read_to_string(data_file("param.json")).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
    edit(value.as_object_mut().unwrap());

    let dir = tempdir().unwrap();
    let path = dir.path().join("param.json");
    std::fs::write(&path, value.to_string()).unwrap();
    (dir, path)
}

fn loopsel(args: &[&str], rust_log: &str, cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_loopsel"))
        .args(args)
        .env("RUST_LOG", rust_log)
        .current_dir(cwd)
        .output()
        .expect("Failed to run loopsel")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn missing_param_key_exits_before_reading_input() {
    let (dir, param) = param_file(|obj| {
        obj.remove("regConstraint");
    });
    let output = loopsel(
        &["does-not-exist.tir", "--param", param.to_str().unwrap()],
        "off",
        dir.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Missing parameter in param.json: regConstraint"),
        "stderr: {stderr}"
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn vector_add_prints_each_decision_once() {
    let dir = tempdir().unwrap();
    let input = data_file("vector_add.tir");
    let param = data_file("param.json");
    let output = loopsel(
        &[input.to_str().unwrap(), "--param", param.to_str().unwrap()],
        "info",
        dir.path(),
    );

    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        ["[Loop Selection] Auto-selected vectorized loop"]
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("[Loop Selection]"), "stderr: {stderr}");
}

#[test]
fn emit_plan_writes_selected_loops_as_json() {
    let dir = tempdir().unwrap();
    let input = data_file("vector_add.tir");
    let param = data_file("param.json");
    let plan_path = dir.path().join("plan.json");
    let output = loopsel(
        &[
            input.to_str().unwrap(),
            "--param",
            param.to_str().unwrap(),
            "--emit-plan",
            plan_path.to_str().unwrap(),
        ],
        "off",
        dir.path(),
    );
    assert!(output.status.success());

    let text = std::fs::read_to_string(&plan_path).unwrap();
    let plans: serde_json::Value = serde_json::from_str(&text).unwrap();
    // main and printf are not kernels.
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 1);

    let plan = &plans[0];
    assert_eq!(plan["function"], "kernel");
    assert_eq!(plan["targetEntireFunction"], false);
    let loops = plan["loops"].as_array().unwrap();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0]["header"], "vector.body");
    assert_eq!(loops[0]["class"], "vectorized");
    assert_eq!(loops[0]["candidateIndex"], 0);
}

#[test]
fn kernel_absent_from_module_is_reported() {
    let (dir, param) = param_file(|obj| {
        obj.insert("kernel".into(), "saxpy".into());
    });
    let input = data_file("vector_add.tir");
    let output = loopsel(
        &[input.to_str().unwrap(), "--param", param.to_str().unwrap()],
        "warn",
        dir.path(),
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Kernel saxpy is not defined"), "stderr: {stderr}");
}
