use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// A small gray scan so simulated runs stay fast
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[device]
model = "canon-lide-100"

[scan]
resolution = 300
color_mode = "gray"
depth = 8

[scan.area]
tl_x = 0.0
tl_y = 0.0
br_x = 25.4
br_y = 10.0

[io]
stop_poll_ms = 1
stop_max_polls = 5
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn genesys() -> Command {
    let mut cmd = Command::cargo_bin("genesys").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["list-models"], 0, "canon-lide-100", "stdout")]
#[case(&["resolutions", "--model", "canon-lide-100"], 0, "1200", "stdout")]
#[case(&["resolutions", "--model", "no-such-scanner"], 1, "no-such-scanner", "stderr")]
#[case(&["slope", "--exposure", "2848"], 2, "required", "stderr")]
#[case(&["slope", "--motor", "bogus", "--exposure", "2848"], 2, "unknown motor", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let assert = genesys().args(args).assert().code(code);
    if stream == "stdout" {
        assert.stdout(predicate::str::contains(needle));
    } else {
        assert.stderr(predicate::str::contains(needle));
    }
}

#[test]
fn list_models_json_lines() {
    let out = genesys()
        .args(["--json", "list-models"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let models: Vec<serde_json::Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(models.len() >= 4);
    let lide = models
        .iter()
        .find(|m| m["name"] == "canon-lide-100")
        .expect("lide 100 listed");
    assert_eq!(lide["vendor"], "Canon");
    assert!(lide["methods"].as_array().unwrap().iter().any(|m| m == "flatbed"));
}

#[test]
fn slope_json_reports_profile_table() {
    let out = genesys()
        .args([
            "--json",
            "slope",
            "--motor",
            "canon-lide-100",
            "--exposure",
            "2848",
            "--entries",
            "8",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["motor"], "canon-lide-100");
    assert_eq!(v["profile_exposure"], 2848);
    let entries = v["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 8);
    let first = entries[0].as_u64().unwrap();
    let last = entries[7].as_u64().unwrap();
    assert!(first >= last, "ramp must not speed down: {first} < {last}");
    assert!(v["scan_steps"].as_u64().unwrap() > 0);
}

#[test]
fn slope_without_profiles_uses_requested_step_type() {
    genesys()
        .args([
            "slope",
            "--motor",
            "hp2300",
            "--exposure",
            "5000",
            "--yres",
            "150",
            "--step-type",
            "half",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Half").and(predicate::str::contains("table:")));
}

#[test]
fn session_from_config_prints_geometry_and_registers() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    genesys()
        .args(["--config", cfg.to_str().unwrap(), "session", "--registers"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("300x300 dpi")
                .and(predicate::str::contains("1 channel(s)"))
                .and(predicate::str::contains("0x01 = ")),
        );
}

#[test]
fn session_json_with_overrides() {
    let out = genesys()
        .args([
            "--json",
            "session",
            "--model",
            "canon-lide-100",
            "--resolution",
            "150",
            "--mode",
            "color",
            "--width-mm",
            "50.8",
            "--height-mm",
            "25.4",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["params"]["xres"], 150);
    assert_eq!(v["params"]["pixels"], 300);
    assert_eq!(v["params"]["lines"], 150);
    assert_eq!(v["params"]["channels"], 3);
    assert!(v.get("registers").is_none());
}

#[test]
fn unsupported_resolution_fails_with_hint() {
    genesys()
        .args([
            "session",
            "--model",
            "canon-lide-100",
            "--resolution",
            "4800",
            "--mode",
            "gray",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("What happened"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[device]\nmodel = \"canon-lide-100\"\n[scan]\ndepth = 12\n",
    )
    .unwrap();
    genesys()
        .args(["--config", path.to_str().unwrap(), "session"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("depth"));
}

#[test]
fn scan_writes_pgm() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = dir.path().join("page.pgm");
    genesys()
        .args([
            "--config",
            cfg.to_str().unwrap(),
            "scan",
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("scan complete"));

    let bytes = fs::read(&out).unwrap();
    let text = String::from_utf8_lossy(&bytes[..bytes.len().min(32)]).into_owned();
    let tokens: Vec<&str> = text.split_whitespace().take(4).collect();
    assert_eq!(tokens, ["P5", "300", "118", "255"]);
    // header tokens are whitespace-separated and end with a single whitespace byte
    let mut seen = 0;
    let mut header_len = 0;
    let mut in_token = false;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_whitespace() {
            if in_token {
                seen += 1;
                in_token = false;
                if seen == 4 {
                    header_len = i + 1;
                    break;
                }
            }
        } else {
            in_token = true;
        }
    }
    assert_eq!(bytes.len() - header_len, 300 * 118);
}

#[test]
fn scan_json_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let out = dir.path().join("page.pgm");
    let stdout = genesys()
        .args([
            "--json",
            "--config",
            cfg.to_str().unwrap(),
            "scan",
            "--output",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
    assert_eq!(v["pixels"], 300);
    assert_eq!(v["lines"], 118);
    assert!(v["bytes_read"].as_u64().unwrap() >= 300 * 118);
}
