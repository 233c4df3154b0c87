//! JSON loaders for test cases and captured nodal results.

use std::fs;
use std::path::Path;

use rve_model::{CapturedLoadCase, TestCase};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IoError, Result};

/// Retained-node results exported from a solver run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedResults {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub case_id: Option<String>,
    pub load_cases: Vec<CapturedLoadCase>,
}

fn default_schema_version() -> u32 {
    1
}

impl CapturedResults {
    pub fn new(case_id: Option<String>, load_cases: Vec<CapturedLoadCase>) -> Self {
        Self {
            schema_version: default_schema_version(),
            case_id,
            load_cases,
        }
    }
}

/// Read a test case and resolve its paths against the file's directory
pub fn load_test_case(path: impl AsRef<Path>) -> Result<TestCase> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    let case: TestCase = serde_json::from_slice(&bytes).map_err(|source| IoError::TestCase {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        case_id = %case.case_id,
        load_cases = case.num_load_cases(),
        "loaded test case from {}",
        path.display()
    );
    Ok(case.with_path(path))
}

pub fn load_captured_results(path: impl AsRef<Path>) -> Result<CapturedResults> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(IoError::FileNotFound(path.to_path_buf()));
    }
    let captured: CapturedResults = serde_json::from_slice(&fs::read(path)?)?;
    let mut seen = std::collections::BTreeSet::new();
    for case in &captured.load_cases {
        if case.load_case == 0 || !seen.insert(case.load_case) {
            return Err(IoError::InvalidData(format!(
                "load case numbers must be unique and start at 1; got {} in {}",
                case.load_case,
                path.display()
            )));
        }
    }
    Ok(captured)
}

pub fn save_captured_results(path: impl AsRef<Path>, captured: &CapturedResults) -> Result<()> {
    save_json(path, captured)
}

/// Pretty-print any serializable value to a file, creating parent folders
pub fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(value)?)?;
    Ok(())
}
