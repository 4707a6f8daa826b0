//! Batch test-case descriptions read from JSON.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::generator::MethodSpec;
use crate::output::sanitize_identifier;

#[derive(Debug, thiserror::Error)]
pub enum CaseError {
    #[error("failed to read test cases: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid test case JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One entry of a `[{name, class_description, methods: {name: description}}]` batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub class_description: String,
    #[serde(default)]
    pub methods: IndexMap<String, String>,
}

impl TestCase {
    /// Methods in the order the file lists them.
    #[must_use]
    pub fn method_specs(&self) -> Vec<MethodSpec> {
        self.methods
            .iter()
            .map(|(name, desc)| MethodSpec::new(name, desc))
            .collect()
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.java", sanitize_identifier(&self.name))
    }
}

/// # Errors
///
/// Returns [`CaseError::Json`] if `json` is not a list of test cases.
pub fn parse_test_cases(json: &str) -> Result<Vec<TestCase>, CaseError> {
    Ok(serde_json::from_str(json)?)
}

/// # Errors
///
/// Returns [`CaseError`] if the file cannot be read or parsed.
pub async fn load_test_cases(path: &Path) -> Result<Vec<TestCase>, CaseError> {
    let json = tokio::fs::read_to_string(path).await?;
    let cases = parse_test_cases(&json)?;
    tracing::debug!(path = %path.display(), cases = cases.len(), "test cases loaded");
    Ok(cases)
}
