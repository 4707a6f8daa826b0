//! Source language detection by file extension.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Programming language of a source-code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Java,
    Kotlin,
    Scala,
    Groovy,
    Python,
    Rust,
    JavaScript,
    TypeScript,
    Go,
    C,
    Cpp,
    CSharp,
    Ruby,
    Php,
    Swift,
    Bash,
    Sql,
}

impl Lang {
    /// Identifier stored in chunk metadata.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
            Self::Groovy => "groovy",
            Self::Python => "python",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Go => "go",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Swift => "swift",
            Self::Bash => "bash",
            Self::Sql => "sql",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Extensions recognized as source code.
pub const CODE_EXTENSIONS: &[&str] = &[
    "java", "kt", "kts", "scala", "groovy", "gradle", "py", "pyi", "rs", "js", "jsx", "mjs",
    "cjs", "ts", "tsx", "mts", "cts", "go", "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "cs",
    "rb", "php", "swift", "sh", "bash", "zsh", "sql",
];

/// Detect language from file extension.
#[must_use]
pub fn detect_language(path: &Path) -> Option<Lang> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "java" => Some(Lang::Java),
        "kt" | "kts" => Some(Lang::Kotlin),
        "scala" => Some(Lang::Scala),
        "groovy" | "gradle" => Some(Lang::Groovy),
        "py" | "pyi" => Some(Lang::Python),
        "rs" => Some(Lang::Rust),
        "js" | "jsx" | "mjs" | "cjs" => Some(Lang::JavaScript),
        "ts" | "tsx" | "mts" | "cts" => Some(Lang::TypeScript),
        "go" => Some(Lang::Go),
        "c" | "h" => Some(Lang::C),
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => Some(Lang::Cpp),
        "cs" => Some(Lang::CSharp),
        "rb" => Some(Lang::Ruby),
        "php" => Some(Lang::Php),
        "swift" => Some(Lang::Swift),
        "sh" | "bash" | "zsh" => Some(Lang::Bash),
        "sql" => Some(Lang::Sql),
        _ => None,
    }
}
