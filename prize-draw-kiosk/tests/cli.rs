use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "prize-draw-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

fn kiosk(state_dir: &Path, args: &[&str]) -> Output {
    let exe = env!("CARGO_BIN_EXE_prize-draw-kiosk");
    Command::new(exe)
        .arg("--state-dir")
        .arg(state_dir)
        .args(args)
        .output()
        .expect("run cli")
}

fn json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "cli failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("json output")
}

#[test]
fn cli_status_reports_default_stock() {
    let dir = temp_path("status");
    let value = json(&kiosk(&dir, &["--format", "json", "status"]));
    assert_eq!(value["totalStock"], 550);
    assert_eq!(value["inventory"]["はずれ"], 418);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cli_draws_persist_across_invocations() {
    let dir = temp_path("draw");
    for seed in ["1", "2", "3"] {
        let value = json(&kiosk(
            &dir,
            &["--format", "json", "draw", "--visits", "4", "--seed", seed],
        ));
        assert!(value["prize"].is_string());
    }
    let status = json(&kiosk(&dir, &["--format", "json", "status"]));
    assert_eq!(status["totalStock"], 547);
    let counts = status["drawCounts"].as_object().expect("counts object");
    let drawn: u64 = counts.values().filter_map(serde_json::Value::as_u64).sum();
    assert_eq!(drawn, 3);
    assert!(dir.join("drawCounts.json").exists());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cli_refuses_ineligible_draw() {
    let dir = temp_path("ineligible");
    let output = kiosk(&dir, &["draw", "--visits", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("あと 3 回"), "stderr: {stderr}");
}

#[test]
fn cli_admin_edits_and_reset() {
    let dir = temp_path("admin");
    let value = json(&kiosk(
        &dir,
        &["--format", "json", "add-stock", "大当たり=2", "はずれ=-18"],
    ));
    assert_eq!(value["baseStock"]["大当たり"], 5);
    assert_eq!(value["baseStock"]["はずれ"], 400);

    let value = json(&kiosk(
        &dir,
        &["--format", "json", "params", "--n", "1", "--mcap", "3"],
    ));
    assert_eq!(value["params"]["N"], 1);
    assert_eq!(value["params"]["Mcap"], 3.0);

    let value = json(&kiosk(
        &dir,
        &["--format", "json", "targets", "--gain", "大当たり", "--lose", "はずれ"],
    ));
    assert_eq!(value["targets"]["gainTargets"], serde_json::json!(["大当たり"]));

    let value = json(&kiosk(&dir, &["--format", "json", "reset", "--yes"]));
    assert_eq!(value["totalStock"], 550);
    assert_eq!(value["params"]["N"], 1);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cli_counts_visits_from_history_file() {
    let dir = temp_path("visits");
    std::fs::create_dir_all(&dir).expect("create dir");
    let history = dir.join("history.json");
    std::fs::write(
        &history,
        r#"[
            {"attraction":"mbti","visitedAt":"2025-10-01T10:00:00Z"},
            {"attraction":"prize","visitedAt":"2025-10-01T12:00:00Z"},
            {"attraction":"battle","visitedAt":"2025-10-01T11:00:00Z"},
            {"attraction":"picture","visitedAt":"2025-10-01T13:00:00Z"}
        ]"#,
    )
    .expect("write history");
    let value = json(&kiosk(
        &dir,
        &["--format", "json", "visits", "--history", history.to_str().expect("utf8")],
    ));
    assert_eq!(value["visits"], 1);
    assert_eq!(value["canDraw"], false);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cli_simulation_is_reproducible() {
    let dir = temp_path("simulate");
    let args = [
        "--format", "json", "simulate", "--visits", "6", "--draws", "2000", "--seed", "77",
    ];
    let first = json(&kiosk(&dir, &args));
    let second = json(&kiosk(&dir, &args));
    assert_eq!(first["rows"], second["rows"]);
    assert_eq!(first["draws"], 2000);
    assert!(!dir.exists(), "simulation must not write state");
}

#[test]
fn cli_console_output_goes_to_file() {
    let dir = temp_path("output");
    let output_path = temp_path("output-file");
    let status = Command::new(env!("CARGO_BIN_EXE_prize-draw-kiosk"))
        .arg("--state-dir")
        .arg(&dir)
        .arg("--output")
        .arg(&output_path)
        .args(["probs", "--visits", "3"])
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Current Odds"));
    assert!(content.contains("抽選する"));
    let _ = std::fs::remove_file(output_path);
}
