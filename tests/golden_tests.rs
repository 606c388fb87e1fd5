//! Golden tests for mdast output stability.
//!
//! Every source tree in `tests/golden/fixtures/` is transformed with the
//! standard rules and compared against the file of the same name in
//! `tests/golden/expected/`.
//!
//! ## Updating Golden Files
//!
//! When making intentional output changes:
//! ```bash
//! MYSTBUILD_UPDATE_GOLDEN=1 cargo test golden
//! git diff tests/golden/  # Review changes
//! ```

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use mystbuild::builder::transform_file;
use mystbuild::engine::RuleSet;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Directory containing golden source trees.
fn golden_fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("golden")
        .join("fixtures")
}

/// Directory containing expected mdast files.
fn golden_expected_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("golden")
        .join("expected")
}

/// Check if golden update mode is enabled.
fn update_mode() -> bool {
    std::env::var("MYSTBUILD_UPDATE_GOLDEN").is_ok()
}

/// Compare two JSON values and return a diff if they don't match.
fn compare_json(expected: &Value, actual: &Value) -> Result<(), String> {
    if expected == actual {
        return Ok(());
    }
    let expected_str = serde_json::to_string_pretty(expected).unwrap();
    let actual_str = serde_json::to_string_pretty(actual).unwrap();
    Err(format!(
        "JSON mismatch:\n--- expected ---\n{}\n--- actual ---\n{}",
        expected_str, actual_str
    ))
}

/// Transform a fixture and compare (or update) its golden file.
fn run_golden_test(name: &str) -> Result<(), String> {
    let fixture = golden_fixtures_dir().join(format!("{name}.json"));
    let transformed = transform_file(&fixture, &RuleSet::standard())
        .map_err(|e| format!("Failed to transform {:?}: {}", fixture, e))?;
    let actual = transformed
        .transformation
        .root
        .to_value()
        .map_err(|e| format!("Failed to serialize mdast: {}", e))?;

    let golden_path = golden_expected_dir().join(format!("{name}.json"));

    if update_mode() {
        let pretty = serde_json::to_string_pretty(&actual)
            .map_err(|e| format!("Failed to serialize JSON: {}", e))?;
        fs::write(&golden_path, pretty + "\n")
            .map_err(|e| format!("Failed to write golden file: {}", e))?;
        eprintln!("Updated golden file: {:?}", golden_path);
        Ok(())
    } else {
        let golden_content = fs::read_to_string(&golden_path)
            .map_err(|e| format!("Failed to read golden file {:?}: {}", golden_path, e))?;
        let expected: Value = serde_json::from_str(&golden_content)
            .map_err(|e| format!("Failed to parse golden file: {}", e))?;
        compare_json(&expected, &actual)
    }
}

// ============================================================================
// Golden Tests
// ============================================================================

#[test]
fn golden_guide() {
    if let Err(e) = run_golden_test("guide") {
        panic!("{}", e);
    }
}

#[test]
fn golden_fixtures_all_have_expected_output() {
    let mut missing = Vec::new();
    for entry in fs::read_dir(golden_fixtures_dir()).unwrap() {
        let entry = entry.unwrap();
        let expected = golden_expected_dir().join(entry.file_name());
        if !expected.is_file() {
            missing.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    assert!(missing.is_empty(), "fixtures without golden output: {missing:?}");
}

#[test]
fn golden_guide_drops_trailing_anchor() {
    let fixture = golden_fixtures_dir().join("guide.json");
    let transformed = transform_file(&fixture, &RuleSet::standard()).unwrap();
    let stats = transformed.transformation.stats;
    assert_eq!(stats.sibling_actions_applied, 2);
    assert_eq!(stats.dangling_actions, 1);
    assert_eq!(stats.open_records, 0);
    assert_eq!(stats.pending_actions, 0);
}
