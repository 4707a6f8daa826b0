//! Writing generated artifacts to disk.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::java::JavaSourceInfo;

/// Replace every character that is not ASCII alphanumeric or `_` with `_`.
#[must_use]
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// `root/com/example/Foo.java` for package `com.example` and class `Foo`.
#[must_use]
pub fn java_file_path(root: &Path, package: Option<&str>, class_name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    if let Some(package) = package {
        path.extend(package.split('.').filter(|s| !s.is_empty()));
    }
    path.join(format!("{class_name}.java"))
}

/// Write `code` to `dir/{ClassName}.java` (or `GeneratedTest.java`), creating `dir`.
///
/// # Errors
///
/// Returns an I/O error if the directory or file cannot be written.
pub async fn save_generated_test(code: &str, dir: &Path) -> io::Result<PathBuf> {
    let file_name = JavaSourceInfo::parse(code).file_name();
    save_as(code, dir, &file_name).await
}

/// # Errors
///
/// Returns an I/O error if the directory or file cannot be written.
pub async fn save_as(content: &str, dir: &Path, file_name: &str) -> io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, content).await?;
    tracing::info!(path = %path.display(), "saved");
    Ok(path)
}

/// Pretty-print `value` as JSON into `path`, creating parent directories.
///
/// # Errors
///
/// Returns an I/O error if serialization or the write fails.
pub async fn write_json<T: Serialize>(value: &T, path: &Path) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_non_identifier_chars() {
        assert_eq!(sanitize_identifier("/users/{id}"), "_users__id_");
        assert_eq!(sanitize_identifier("plain_Name1"), "plain_Name1");
    }

    #[test]
    fn java_path_follows_package() {
        let root = Path::new("src/test/java");
        assert_eq!(
            java_file_path(root, Some("com.example.calc"), "CalcTest"),
            PathBuf::from("src/test/java/com/example/calc/CalcTest.java")
        );
        assert_eq!(
            java_file_path(root, None, "CalcTest"),
            PathBuf::from("src/test/java/CalcTest.java")
        );
    }

    #[tokio::test]
    async fn save_uses_class_name_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated/nested");
        let path = save_generated_test("public class FooTest {}", &out).await.unwrap();
        assert_eq!(path, out.join("FooTest.java"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "public class FooTest {}");
    }

    #[tokio::test]
    async fn save_without_class_uses_fallback_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_generated_test("// nothing here", dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "GeneratedTest.java");
    }

    #[tokio::test]
    async fn write_json_pretty_prints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/analysis.json");
        write_json(&serde_json::json!({"files": 2}), &path).await.unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "{\n  \"files\": 2\n}");
    }
}
