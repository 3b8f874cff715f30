//! Integration tests for feature_runtime.
//!
//! All tests use temporary directories for isolation.

use std::fs;
use std::path::PathBuf;

use feature_resolver::reference::reference_table;
use feature_resolver::{resolve, Expr, RuleTable};

use feature_runtime::batch::resolve_all;
use feature_runtime::config::BuildConfig;
use feature_runtime::drift::compare;
use feature_runtime::report::{load_report, save_report, verify_report, ResolutionReport};
use feature_runtime::rule_file::{export_rules_to_file, import_rules_from_file};

/// Fingerprint of the built-in reference rule table.
const GOLDEN_RULES_HASH: &str =
    "2ec93456cd430a37b5744bf5cdc15c1e335251f08c7135874ba2ca049534b045";

/// Fingerprint of resolving {ELECTROSTATICS, FFTW} against the reference table.
const GOLDEN_P3M_HASH: &str =
    "8c6b806094c24b4f2a85a0ed839b1855ac7e71084f22aedd1dfb5f4b2c503ce7";

/// Create a temp directory for a test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("feature_runtime_tests")
        .join(name);
    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

// ─────────────────────────────────────────────────────────────
// Test 1: report_matches_golden_hashes
// ─────────────────────────────────────────────────────────────

#[test]
fn report_matches_golden_hashes() {
    let table = reference_table();
    let request = ["ELECTROSTATICS", "FFTW"];
    let resolution = resolve(&table, request).unwrap();
    let report = ResolutionReport::new(&table, &request[..], &resolution);

    assert_eq!(report.rules_hash, GOLDEN_RULES_HASH);
    assert_eq!(report.outcome_hash, GOLDEN_P3M_HASH);
    assert!(verify_report(&report));
    assert_eq!(report.features, vec!["ELECTROSTATICS", "P3M", "FFTW"]);
}

// ─────────────────────────────────────────────────────────────
// Test 2: exported_rules_resolve_identically
// ─────────────────────────────────────────────────────────────

#[test]
fn exported_rules_resolve_identically() {
    let dir = temp_dir("exported_rules");
    let path = dir.join("rules.json");
    let table = reference_table();

    export_rules_to_file(&table, &path).unwrap();
    let imported = import_rules_from_file(&path).unwrap();

    assert_eq!(imported.flags(), table.flags());
    let request = ["EK_BOUNDARIES", "DIPOLES", "FFTW"];
    let a = resolve(&table, request).unwrap();
    let b = resolve(&imported, request).unwrap();
    assert_eq!(a.active_flags(), b.active_flags());
    assert_eq!(a.diagnostics, b.diagnostics);

    let report = ResolutionReport::new(&imported, &request[..], &b);
    assert_eq!(report.rules_hash, GOLDEN_RULES_HASH);
}

// ─────────────────────────────────────────────────────────────
// Test 3: config_with_custom_rules
// ─────────────────────────────────────────────────────────────

#[test]
fn config_with_custom_rules() {
    let dir = temp_dir("custom_rules_config");
    let table = RuleTable::builder()
        .implies("GPU_SOLVER", "CUDA")
        .derived("ACCEL", Expr::any_of(["CUDA", "OPENCL"]))
        .build()
        .unwrap();
    export_rules_to_file(&table, &dir.join("rules.json")).unwrap();
    fs::write(
        dir.join("build.toml"),
        r#"
rules = "rules.json"

[profiles.gpu]
features = ["GPU_SOLVER"]

[profiles.manual]
features = ["ACCEL"]
deny_warnings = true
"#,
    )
    .unwrap();

    let config = BuildConfig::load(&dir.join("build.toml")).unwrap();
    let rules = config.load_rules().unwrap();
    let outcomes = resolve_all(&rules, &config);

    assert_eq!(outcomes.len(), 2);
    let gpu = outcomes[0].result.as_ref().unwrap();
    assert_eq!(gpu.active_flags(), vec!["GPU_SOLVER", "CUDA", "ACCEL"]);
    assert!(!outcomes[0].failed());

    assert_eq!(outcomes[1].profile, "manual");
    assert!(outcomes[1].failed());
}

// ─────────────────────────────────────────────────────────────
// Test 4: saved_report_detects_tampering
// ─────────────────────────────────────────────────────────────

#[test]
fn saved_report_detects_tampering() {
    let dir = temp_dir("report_tampering");
    let path = dir.join("report.json");
    let table = reference_table();
    let request = ["LB_BOUNDARIES_GPU"];
    let resolution = resolve(&table, request).unwrap();
    save_report(&path, &ResolutionReport::new(&table, &request[..], &resolution)).unwrap();

    assert!(verify_report(&load_report(&path).unwrap()));

    // Drop a feature by hand; the stored hash no longer matches.
    let content = fs::read_to_string(&path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
    let features = value["features"].as_array_mut().unwrap();
    features.pop();
    let count = features.len();
    value["count"] = serde_json::Value::from(count);
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    assert!(!verify_report(&load_report(&path).unwrap()));
}

// ─────────────────────────────────────────────────────────────
// Test 5: drift_between_saved_reports
// ─────────────────────────────────────────────────────────────

#[test]
fn drift_between_saved_reports() {
    let dir = temp_dir("drift_reports");
    let table = reference_table();

    let old_request = ["ELECTROSTATICS", "FFTW"];
    let new_request = ["ELECTROSTATICS", "FFTW", "DIPOLES"];
    let old = ResolutionReport::new(&table, &old_request[..], &resolve(&table, old_request).unwrap());
    let new = ResolutionReport::new(&table, &new_request[..], &resolve(&table, new_request).unwrap());
    save_report(&dir.join("old.json"), &old).unwrap();
    save_report(&dir.join("new.json"), &new).unwrap();

    let drift = compare(
        &load_report(&dir.join("old.json")).unwrap(),
        &load_report(&dir.join("new.json")).unwrap(),
    );
    assert!(drift.removed_features.is_empty());
    assert!(drift.added_features.contains(&"DIPOLES".to_string()));
    assert!(drift.added_features.contains(&"DP3M".to_string()));
    assert_eq!(drift.count_delta, 2);
    assert!(drift.same_rules);
    assert!(!drift.same_outcome);
}

// ─────────────────────────────────────────────────────────────
// Test 6: saved_report_cannot_be_retargeted
// ─────────────────────────────────────────────────────────────

#[test]
fn saved_report_cannot_be_retargeted() {
    let dir = temp_dir("report_retargeted");
    let path = dir.join("report.json");
    let table = reference_table();
    let request = ["ELECTROSTATICS", "FFTW"];
    let resolution = resolve(&table, request).unwrap();
    save_report(&path, &ResolutionReport::new(&table, &request[..], &resolution)).unwrap();

    // Point the report at another rule table and request.
    let other = RuleTable::builder().implies("A", "B").build().unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
    value["rules_hash"] = serde_json::Value::from(feature_resolver::hashing::rules_fingerprint(&other));
    value["requested"] = serde_json::json!(["A"]);
    fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    let forged = load_report(&path).unwrap();
    assert!(!verify_report(&forged));
}
