//! Heuristic structure extraction for Java sources.
//!
//! Regex-based and deliberately shallow: anything the patterns miss comes back as
//! `None` or an empty list rather than an error.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").unwrap());

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\s+((?:static\s+)?[\w.]+(?:\.\*)?)\s*;").unwrap());

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:(?:public|protected|private|abstract|final|static)\s+)*class\s+(\w+)")
        .unwrap()
});

static TEST_METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"@Test\b(?:\s*\([^)]*\))?\s+(?:@\w+(?:\([^)]*\))?\s+)*(?:(?:public|protected|private|static|final)\s+)*void\s+(\w+)\s*\(",
    )
    .unwrap()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JavaSourceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub imports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub test_methods: Vec<String>,
}

impl JavaSourceInfo {
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let first_capture = |re: &Regex| {
            re.captures(source)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_owned())
        };
        let all_captures = |re: &Regex| {
            re.captures_iter(source)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_owned())
                .collect::<Vec<_>>()
        };

        Self {
            package: first_capture(&PACKAGE_RE),
            imports: all_captures(&IMPORT_RE),
            class_name: first_capture(&CLASS_RE),
            test_methods: all_captures(&TEST_METHOD_RE),
        }
    }

    /// `{ClassName}.java`, or `GeneratedTest.java` when no class was found.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.java", self.class_name.as_deref().unwrap_or("GeneratedTest"))
    }
}

/// One analyzed file in a source-tree report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JavaFileReport {
    pub file: PathBuf,
    #[serde(flatten)]
    pub info: JavaSourceInfo,
}

/// Parse every `*.java` file under `dir`, in path order.
///
/// Unreadable files are logged and skipped.
///
/// # Errors
///
/// Returns [`io::ErrorKind::NotFound`] if `dir` does not exist or holds no Java files.
pub async fn analyze_java_sources(dir: &Path) -> io::Result<Vec<JavaFileReport>> {
    if !tokio::fs::try_exists(dir).await? {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", dir.display()),
        ));
    }

    let files: Vec<PathBuf> = testgen_rag::document::collect_files(&[dir.to_path_buf()])
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "java"))
        .collect();
    if files.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no .java files under {}", dir.display()),
        ));
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        match tokio::fs::read_to_string(&file).await {
            Ok(source) => reports.push(JavaFileReport {
                info: JavaSourceInfo::parse(&source),
                file,
            }),
            Err(e) => tracing::warn!(path = %file.display(), error = %e, "skipping unreadable source"),
        }
    }
    tracing::info!(files = reports.len(), dir = %dir.display(), "java sources analyzed");
    Ok(reports)
}
