//! Minimal OpenAPI document reader: endpoints, schemas, and per-endpoint test plans.

use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::generator::MethodSpec;
use crate::output::sanitize_identifier;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

#[derive(Debug, thiserror::Error)]
pub enum OpenApiError {
    #[error("failed to read OpenAPI document: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid OpenAPI JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid OpenAPI YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported OpenAPI document format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    root: Value,
}

/// One `(path, method)` operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub path: String,
    /// Uppercase HTTP method.
    pub method: String,
    pub parameters: Vec<Value>,
    pub responses: Map<String, Value>,
}

/// Class description plus the test methods to generate for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPlan {
    pub class_description: String,
    pub methods: Vec<MethodSpec>,
}

impl OpenApiDocument {
    /// Load a `.json`, `.yaml` or `.yml` document.
    ///
    /// # Errors
    ///
    /// Returns [`OpenApiError::UnsupportedFormat`] for other extensions, or the read or
    /// parse error.
    pub async fn load(path: &Path) -> Result<Self, OpenApiError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let parse: fn(&str) -> Result<Self, OpenApiError> = match ext.as_str() {
            "json" => Self::from_json_str,
            "yaml" | "yml" => Self::from_yaml_str,
            _ => return Err(OpenApiError::UnsupportedFormat(path.display().to_string())),
        };
        let text = tokio::fs::read_to_string(path).await?;
        let doc = parse(&text)?;
        tracing::debug!(path = %path.display(), endpoints = doc.endpoints().len(), "OpenAPI document loaded");
        Ok(doc)
    }

    /// # Errors
    ///
    /// Returns [`OpenApiError::Json`] on malformed input.
    pub fn from_json_str(text: &str) -> Result<Self, OpenApiError> {
        Ok(Self {
            root: serde_json::from_str(text)?,
        })
    }

    /// # Errors
    ///
    /// Returns [`OpenApiError::Yaml`] on malformed input.
    pub fn from_yaml_str(text: &str) -> Result<Self, OpenApiError> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
        Ok(Self {
            root: yaml_to_json(yaml),
        })
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.root.pointer("/info/title").and_then(Value::as_str)
    }

    /// Every HTTP operation under `paths`. Non-method keys such as path-level
    /// `parameters` are ignored.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let Some(paths) = self.root.get("paths").and_then(Value::as_object) else {
            return Vec::new();
        };

        let mut endpoints = Vec::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for (method, operation) in item {
                if !HTTP_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                    continue;
                }
                endpoints.push(Endpoint {
                    path: path.clone(),
                    method: method.to_ascii_uppercase(),
                    parameters: operation
                        .get("parameters")
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default(),
                    responses: operation
                        .get("responses")
                        .and_then(Value::as_object)
                        .cloned()
                        .unwrap_or_default(),
                });
            }
        }
        endpoints
    }

    /// `components.schemas`, empty when absent.
    #[must_use]
    pub fn schemas(&self) -> Map<String, Value> {
        self.root
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

impl Endpoint {
    fn sanitized_path(&self) -> String {
        sanitize_identifier(&self.path)
    }

    #[must_use]
    pub fn test_plan(&self) -> TestPlan {
        let (method, path) = (&self.method, &self.path);
        let stem = format!("test{method}{}", self.sanitized_path());
        TestPlan {
            class_description: format!("Tests for {method} {path}"),
            methods: vec![
                MethodSpec::new(
                    format!("{stem}Success"),
                    format!("Verify the successful scenario for {method} {path}"),
                ),
                MethodSpec::new(
                    format!("{stem}Error"),
                    format!("Verify the error scenario for {method} {path}"),
                ),
            ],
        }
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_{}_Tests.java", self.method, self.sanitized_path())
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

// Response codes are usually unquoted integers in YAML.
fn yaml_key(key: serde_yaml::Value) -> String {
    match yaml_to_json(key) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
