//! Test data loading utilities for compatibility test cases.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use lgbm_pmml::testing::Record;
use lgbm_pmml::LgbModel;

/// Base directory for test cases.
pub fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/test-cases")
}

/// Directory for LightGBM test cases.
pub fn lightgbm_test_cases_dir() -> PathBuf {
    test_cases_dir().join("lightgbm")
}

/// Load a JSON file and deserialize it.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> T {
    let file =
        File::open(path).unwrap_or_else(|e| panic!("Failed to open {}: {e}", path.display()));
    serde_json::from_reader(file)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()))
}

/// One scored input row.
#[derive(Debug, Deserialize)]
pub struct ExpectedRow {
    /// Input values by field name, as written into the document
    pub values: HashMap<String, String>,
    /// The same row as LightGBM sees it (category codes, all features)
    pub lightgbm_row: Vec<f64>,
    /// Raw score LightGBM predicts for the row
    pub score: f64,
}

impl ExpectedRow {
    pub fn record(&self) -> Record {
        self.values.clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct TestExpected {
    pub rows: Vec<ExpectedRow>,
}

/// A dump together with its expected scores.
pub struct TestCase {
    pub name: String,
    pub model: LgbModel,
    pub expected: TestExpected,
}

pub fn load_test_case(name: &str) -> TestCase {
    let dir = lightgbm_test_cases_dir().join(name);
    let path = dir.join("model.txt");
    let model = LgbModel::from_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {e}", path.display()));
    TestCase {
        name: name.to_owned(),
        model,
        expected: load_json(&dir.join("expected.json")),
    }
}
