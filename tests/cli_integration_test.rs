use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn wp_extract() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wp-extract"))
}

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/wordpress_small.sql")
}

fn read_json(path: PathBuf) -> Value {
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("missing output file: {}", path.display()));
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_extract_writes_all_files() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("out");

    let output = wp_extract()
        .arg("extract")
        .arg(fixture_path())
        .arg("-o")
        .arg(&out_dir)
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== EXTRACTION SUMMARY ==="));
    assert!(stdout.contains("Posts: 6"));
    assert!(stdout.contains("Mohs Surgery"));

    for name in [
        "pages-content.json",
        "services-complete.json",
        "locations-complete.json",
        "providers-complete.json",
        "menu-structure.json",
        "all-posts.json",
        "extraction-summary.json",
    ] {
        assert!(out_dir.join(name).exists(), "{} not written", name);
    }

    let all = read_json(out_dir.join("all-posts.json"));
    assert_eq!(all.as_array().unwrap().len(), 6);
    assert_eq!(all[1]["meta"]["_yoast_title"], "Mohs & More");

    let summary = read_json(out_dir.join("extraction-summary.json"));
    assert_eq!(summary["total_posts"], 6);
    assert_eq!(summary["total_meta_entries"], 5);
    assert_eq!(summary["orphan_meta_posts"], 1);
    assert_eq!(summary["subsets"]["providers"]["list"][0]["title"], "Dr. Jane Smith");
    assert_eq!(summary["statistics"]["rows_dropped"], 1);
}

#[test]
fn test_extract_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let out_dir = temp_dir.path().join("out");

    let output = wp_extract()
        .arg("extract")
        .arg(fixture_path())
        .arg("-o")
        .arg(&out_dir)
        .arg("--dry-run")
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(!out_dir.exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Dry run"));
}

#[test]
fn test_extract_json_report() {
    let temp_dir = TempDir::new().unwrap();

    let output = wp_extract()
        .arg("extract")
        .arg(fixture_path())
        .arg("-o")
        .arg(temp_dir.path())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_posts"], 6);
    assert_eq!(report["orphan_meta_posts"], 1);
    assert_eq!(report["subsets"]["services"], 1);
    assert_eq!(report["files_written"].as_array().unwrap().len(), 7);
    assert!(report.get("compression").is_none());
}

#[test]
fn test_extract_with_custom_rules() {
    let temp_dir = TempDir::new().unwrap();
    let rules_path = temp_dir.path().join("rules.yaml");
    fs::write(
        &rules_path,
        "subsets:\n  - name: drafts\n    all:\n      - field: post_status\n        equals: [draft]\n",
    )
    .unwrap();
    let out_dir = temp_dir.path().join("out");

    let output = wp_extract()
        .arg("extract")
        .arg(fixture_path())
        .arg("-o")
        .arg(&out_dir)
        .arg("--rules")
        .arg(&rules_path)
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let drafts = read_json(out_dir.join("drafts.json"));
    assert_eq!(drafts.as_array().unwrap().len(), 1);
    assert_eq!(drafts[0]["post_title"], "Draft Laser Page");
    assert!(!out_dir.join("pages-content.json").exists());
}

#[test]
fn test_extract_invalid_rules_fails() {
    let temp_dir = TempDir::new().unwrap();
    let rules_path = temp_dir.path().join("rules.yaml");
    fs::write(
        &rules_path,
        "subsets:\n  - name: bad\n    all:\n      - field: colour\n        equals: [red]\n",
    )
    .unwrap();

    let output = wp_extract()
        .arg("extract")
        .arg(fixture_path())
        .arg("--rules")
        .arg(&rules_path)
        .arg("--dry-run")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("colour"));
}

#[test]
fn test_extract_missing_input_fails() {
    let output = wp_extract()
        .args(["extract", "/nonexistent/dump.sql", "--dry-run"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_rows_normalized() {
    let output = wp_extract()
        .arg("rows")
        .arg(fixture_path())
        .args(["-t", "wp_postmeta", "-l", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    let second: Vec<String> = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second, vec!["2", "2", "_yoast_title", "Mohs & More"]);
}

#[test]
fn test_rows_limit_zero_prints_nothing() {
    let output = wp_extract()
        .arg("rows")
        .arg(fixture_path())
        .args(["-t", "wp_postmeta", "-l", "0"])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output.stdout.is_empty());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("No rows found"));
}

#[test]
fn test_rows_unknown_table_reports_no_rows() {
    let output = wp_extract()
        .arg("rows")
        .arg(fixture_path())
        .args(["-t", "wp_comments"])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("No rows found"));
}

#[test]
fn test_rows_raw() {
    let output = wp_extract()
        .arg("rows")
        .arg(fixture_path())
        .args(["-t", "wp_options", "--raw"])
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let row: Vec<String> = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(row, vec!["1", "'siteurl'", "'https://example.com'", "'yes'"]);
}

#[test]
fn test_rules_output_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let rules_path = temp_dir.path().join("default-rules.yaml");

    let output = wp_extract()
        .arg("rules")
        .arg("-o")
        .arg(&rules_path)
        .output()
        .unwrap();
    assert!(output.status.success(), "Command failed: {:?}", output);

    let rules = wp_extract::classify::RuleTable::from_file(&rules_path).unwrap();
    assert_eq!(rules, wp_extract::classify::RuleTable::default());
}

#[test]
fn test_completions() {
    let output = wp_extract().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("wp-extract"));
}
