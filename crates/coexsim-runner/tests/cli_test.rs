//! Integration tests for the coexsim binary.
//!
//! These tests write YAML configurations to a temporary directory, run the
//! compiled binary against them and inspect the JSON report.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

use serde_json::Value;

// ============================================================================
// Helpers
// ============================================================================

fn run_coexsim(args: &[&str]) -> Output {
    // CARGO_BIN_EXE_coexsim is set by cargo when running tests for this crate
    let binary = env!("CARGO_BIN_EXE_coexsim");
    Command::new(binary).args(args).output().expect("Failed to execute coexsim")
}

fn run_ok(args: &[&str]) -> String {
    let output = run_coexsim(args);
    if !output.status.success() {
        panic!(
            "coexsim failed:\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_yaml(dir: &TempDir, name: &str, yaml: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, yaml).expect("Failed to write config");
    path_str(&path)
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn analyze_json(configs: &[&str]) -> Value {
    let mut args = vec!["analyze"];
    args.extend_from_slice(configs);
    let stdout = run_ok(&args);
    serde_json::from_str(&stdout).expect("Failed to parse report JSON")
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_analyze_heuristic_report() {
    let dir = TempDir::new().unwrap();
    let config = write_yaml(
        &dir,
        "gnss.yaml",
        "name: gnss\nbands: [LTE_B13, GNSS_L1]\nanalysis:\n  guard_mhz: 1.0\n",
    );

    let report = analyze_json(&[&config]);
    assert_eq!(report["name"], "gnss");
    assert_eq!(report["bands"], serde_json::json!(["LTE_B13", "GNSS_L1"]));

    let candidates = report["candidates"].as_array().unwrap();
    assert!(!candidates.is_empty());
    let h2 = candidates
        .iter()
        .find(|c| c["product_type"] == "2H" && c["victim"] == "GNSS_L1")
        .expect("2H product on GNSS_L1");
    assert_eq!(h2["severity"], 5);

    assert!(report["quantitative"].as_array().unwrap().is_empty());
    assert!(report["monte_carlo"].is_null());
}

#[test]
fn test_analyze_layered_quantitative() {
    let dir = TempDir::new().unwrap();
    let base = write_yaml(&dir, "base.yaml", "bands: [LTE_B13, GNSS_L1]\n");
    let overlay = write_yaml(
        &dir,
        "overlay.yaml",
        "system:\n  preset: mobile_device_poor\n  overrides:\n    lte_tx_power: 20.0\nmonte_carlo:\n  iterations: 25\n",
    );

    let report = analyze_json(&[&base, &overlay]);
    let results = report["quantitative"].as_array().unwrap();
    assert!(!results.is_empty());
    assert!(results.iter().all(|r| r["aggressor_power_dbm"] == 20.0));

    let mc = &report["monte_carlo"];
    assert_eq!(mc["stats"]["num_iterations"], 25);
    assert!(mc["report"].as_str().unwrap().starts_with("=== Monte Carlo Analysis Report ==="));
}

#[test]
fn test_analyze_empty_selection() {
    let dir = TempDir::new().unwrap();
    let config = write_yaml(&dir, "empty.yaml", "analysis:\n  imd7: true\n");

    let report = analyze_json(&[&config]);
    assert_eq!(report["warnings"], serde_json::json!(["No bands selected for analysis"]));
    assert!(report["candidates"].as_array().unwrap().is_empty());
}

#[test]
fn test_analyze_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let unknown_band = write_yaml(&dir, "band.yaml", "bands: [LTE_B999]\n");
    let output = run_coexsim(&["analyze", &unknown_band]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("LTE_B999"));

    let typo = write_yaml(&dir, "typo.yaml", "system:\n  overrides:\n    iip33: 1.0\n");
    assert!(!run_coexsim(&["analyze", &typo]).status.success());
}

#[test]
fn test_analyze_duty_cycle_averaging() {
    let dir = TempDir::new().unwrap();
    let base = write_yaml(&dir, "ble.yaml", "bands: [BLE, WiFi_2G]\nquantitative: true\n");
    let overlay = write_yaml(&dir, "duty.yaml", "desense:\n  duty_cycle: true\n");

    let report = analyze_json(&[&base, &overlay]);
    let results = report["quantitative"].as_array().unwrap();
    assert!(!results.is_empty());
    for r in results {
        let duty = r["duty_cycle"].as_f64().unwrap();
        assert!(duty < 1.0);
        assert!(r["average_desensitization_db"].as_f64().unwrap() <= r["desensitization_db"].as_f64().unwrap());
        assert!(r["severity_reason"].is_string());
        assert!(r.get("risk_symbol").is_none());
    }
}

#[test]
fn test_analyze_text_format() {
    let dir = TempDir::new().unwrap();
    let config = write_yaml(&dir, "text.yaml", "bands: [LTE_B26, WiFi_2G, BLE]\n");
    let stdout = run_ok(&["analyze", &config, "--format", "text"]);
    assert!(stdout.contains("Bands: LTE_B26, WiFi_2G, BLE"));
    assert!(stdout.contains("Total products:"));
}

#[test]
fn test_custom_catalog() {
    let dir = TempDir::new().unwrap();
    let catalog = write_yaml(
        &dir,
        "catalog.yaml",
        "bands:\n  - { code: TX_A, tx_low: 780.0, tx_high: 790.0, rx_low: 740.0, rx_high: 750.0 }\n  - { code: RX_B, tx_low: 0.0, tx_high: 0.0, rx_low: 1550.0, rx_high: 1600.0 }\n",
    );
    let config = write_yaml(&dir, "custom.yaml", "bands: [TX_A, RX_B]\n");

    let stdout = run_ok(&["analyze", &config, "--catalog", &catalog]);
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert!(report["candidates"]
        .as_array()
        .unwrap()
        .iter()
        .any(|c| c["victim"] == "RX_B"));

    let listing = run_ok(&["bands", "--catalog", &catalog]);
    assert_eq!(listing.lines().count(), 2);
}

#[test]
fn test_demo_and_listings() {
    let demo = run_ok(&["demo"]);
    assert!(demo.contains("SUMMARY OF CRITICAL SCENARIOS"));
    assert!(demo.contains("LTE Band 13 2nd Harmonic"));

    let demo_json: Value = serde_json::from_str(&run_ok(&["demo", "--format", "json"])).unwrap();
    assert_eq!(demo_json.as_array().unwrap().len(), 4);

    let presets = run_ok(&["presets"]);
    assert!(presets.contains("laboratory_reference"));

    let bands = run_ok(&["bands"]);
    assert!(bands.contains("LTE_B13"));
}
