use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use svcscope_core::{Inventory, ServiceRecord, SkippedService};
use time::macros::datetime;
use uuid::Uuid;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn record(name: &str, state: &str, start_type: &str, service_type_code: u32, pid: u32) -> ServiceRecord {
    ServiceRecord {
        name: name.to_string(),
        display_name: format!("{name} Display"),
        description: "None".to_string(),
        state: state.to_string(),
        start_type: start_type.to_string(),
        service_type_code,
        process_id: pid,
        normalized_path: format!("C:\\Windows\\System32\\{}.exe", name.to_lowercase()),
        ..Default::default()
    }
}

fn write_inventory(dir: &Path) -> (PathBuf, Uuid) {
    let pass_id = Uuid::new_v4();
    let inventory = Inventory {
        pass_id,
        collected_at: datetime!(2026-10-18 08:00:00 UTC),
        records: vec![
            record("Dnscache", "Running", "Auto Start", 0x20, 1480),
            record("Spooler", "Running", "Auto Start [Delayed]", 0x10, 2210),
            record("Fax", "Stopped", "Demand Start", 0x10, 0),
            record("Tcpip", "Running", "Boot Start", 0x01, 0),
        ],
        skipped: vec![SkippedService {
            name: "WdNisSvc".to_string(),
            reason: "打开服务失败: 错误码 5: Access is denied.".to_string(),
        }],
    };
    let path = dir.join("inventory.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&inventory).expect("serialize")).expect("write inventory");
    (path, pass_id)
}

fn run(args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_svcscope");
    Command::new(exe).args(args).output().expect("run svcscope")
}

fn assert_success(out: &Output) {
    assert!(
        out.status.success(),
        "svcscope failed: status={:?}, stdout={}, stderr={}",
        out.status.code(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn e2e_render_json_keeps_pass_identity_and_filters_records() {
    let dir = unique_temp_dir("svcscope-render-json");
    let _cleanup = CleanupDir(dir.clone());
    let (path, pass_id) = write_inventory(&dir);
    let input = path.to_string_lossy().to_string();

    let out = run(&["render", "--input", &input, "--state", "running", "--win32"]);
    assert_success(&out);

    let rendered: Inventory = serde_json::from_slice(&out.stdout).expect("stdout is an inventory");
    assert_eq!(rendered.pass_id, pass_id);
    let names: Vec<&str> = rendered.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Dnscache", "Spooler"]);
    assert_eq!(rendered.skipped.len(), 1);
}

#[test]
fn e2e_render_table_lists_matching_services() {
    let dir = unique_temp_dir("svcscope-render-table");
    let _cleanup = CleanupDir(dir.clone());
    let (path, _) = write_inventory(&dir);
    let input = path.to_string_lossy().to_string();

    let out = run(&["render", "--input", &input, "--start-type", "auto", "--format", "table"]);
    assert_success(&out);

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("NAME"), "stdout: {stdout}");
    assert!(stdout.contains("Dnscache"), "stdout: {stdout}");
    assert!(stdout.contains("Auto Start [Delayed]"), "stdout: {stdout}");
    assert!(!stdout.contains("Fax"), "stdout: {stdout}");
    assert!(stdout.contains("2 of 4 services shown, 1 skipped"), "stdout: {stdout}");
}

#[test]
fn e2e_render_drivers_and_name_filters() {
    let dir = unique_temp_dir("svcscope-render-drivers");
    let _cleanup = CleanupDir(dir.clone());
    let (path, _) = write_inventory(&dir);
    let input = path.to_string_lossy().to_string();

    let out = run(&["render", "--input", &input, "--drivers"]);
    assert_success(&out);
    let rendered: Inventory = serde_json::from_slice(&out.stdout).expect("inventory");
    let names: Vec<&str> = rendered.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Tcpip"]);

    let out = run(&["render", "--input", &input, "--name", "SPOOLER display"]);
    assert_success(&out);
    let rendered: Inventory = serde_json::from_slice(&out.stdout).expect("inventory");
    assert_eq!(rendered.records.len(), 1);
    assert_eq!(rendered.records[0].name, "Spooler");
}

#[test]
fn e2e_render_missing_input_fails() {
    let dir = unique_temp_dir("svcscope-render-missing");
    let _cleanup = CleanupDir(dir.clone());
    let input = dir.join("absent.json").to_string_lossy().to_string();

    let out = run(&["render", "--input", &input]);
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn e2e_conflicting_type_filters_are_rejected() {
    let out = run(&["render", "--input", "x.json", "--drivers", "--win32"]);
    assert!(!out.status.success());
}

struct CleanupDir(PathBuf);

impl Drop for CleanupDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
