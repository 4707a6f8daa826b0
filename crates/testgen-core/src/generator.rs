//! Test-generation handlers layered on the retrieval pipeline.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use testgen_llm::LlmProvider;
use testgen_rag::{Chunk, RagError, RagPipeline};

use crate::config::Config;
use crate::java::JavaSourceInfo;
use crate::postprocess::{ensure_doc_tags, strip_code_fences};

const EXAMPLE_SUFFIX: &str = "Test.java";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    pub description: String,
}

impl MethodSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    /// Directory scanned for `*Test.java` style examples.
    pub examples_dir: PathBuf,
    pub examples_limit: usize,
    pub doc_examples: usize,
    pub required_doc_tags: Vec<String>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GeneratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            examples_dir: config.paths.examples_dir.clone(),
            examples_limit: config.generation.examples_limit,
            doc_examples: config.generation.doc_examples,
            required_doc_tags: config.generation.required_doc_tags.clone(),
        }
    }
}

/// A cleaned-up generated test with the context it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedTest {
    pub code: String,
    pub file_name: String,
    pub info: JavaSourceInfo,
    pub context: Vec<Chunk>,
}

impl GeneratedTest {
    fn new(code: String, context: Vec<Chunk>) -> Self {
        let info = JavaSourceInfo::parse(&code);
        Self {
            file_name: info.file_name(),
            code,
            info,
            context,
        }
    }
}

pub struct TestGenerator<P: LlmProvider> {
    pipeline: Arc<RagPipeline<P>>,
    settings: GeneratorSettings,
}

impl<P: LlmProvider> TestGenerator<P> {
    #[must_use]
    pub fn new(pipeline: Arc<RagPipeline<P>>, settings: GeneratorSettings) -> Self {
        Self { pipeline, settings }
    }

    #[must_use]
    pub fn pipeline(&self) -> &RagPipeline<P> {
        &self.pipeline
    }

    #[must_use]
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generate a test from free-form requirements, with example tests as a context prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotReady`] before ingestion, or the embedding/generation error
    /// from the pipeline.
    pub async fn generate_from_requirements(&self, requirements: &str) -> Result<GeneratedTest, RagError> {
        let examples = load_examples(&self.settings.examples_dir, self.settings.examples_limit).await;
        let prefix = examples.join("\n");
        let request = format!("Generate a JUnit test with the following requirements:\n{requirements}");

        tracing::info!(examples = examples.len(), "generating test from requirements");
        let result = self
            .pipeline
            .generate_with_prefix(&request, (!prefix.is_empty()).then_some(prefix.as_str()))
            .await?;

        Ok(GeneratedTest::new(strip_code_fences(&result.answer), result.context))
    }

    /// Generate a documented test class for `class_desc` covering `methods` in order.
    ///
    /// Grounding chunks come from a similarity search on `class_desc`. Required Javadoc
    /// tags missing from the answer are filled in afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotReady`] before ingestion, or the embedding/generation error
    /// from the pipeline.
    pub async fn generate_with_docs(
        &self,
        class_desc: &str,
        methods: &[MethodSpec],
    ) -> Result<GeneratedTest, RagError> {
        let hits = self.pipeline.search(class_desc, self.settings.doc_examples).await?;
        let context: Vec<Chunk> = hits.into_iter().map(|h| h.chunk).collect();
        let request = docs_request(class_desc, methods, &self.settings.required_doc_tags);

        tracing::info!(
            methods = methods.len(),
            context_chunks = context.len(),
            "generating documented test"
        );
        let result = self
            .pipeline
            .generate_from_context(&request, context, None)
            .await?;

        let code = ensure_doc_tags(
            &strip_code_fences(&result.answer),
            &self.settings.required_doc_tags,
        );
        Ok(GeneratedTest::new(code, result.context))
    }
}

fn docs_request(class_desc: &str, methods: &[MethodSpec], tags: &[String]) -> String {
    let mut request = String::from("Generate a JUnit test class with Javadoc documentation.\n");
    let _ = writeln!(request, "Class description: {class_desc}");
    if !methods.is_empty() {
        request.push_str("Test methods:\n");
        for method in methods {
            let _ = writeln!(request, "- {}: {}", method.name, method.description);
        }
    }
    if !tags.is_empty() {
        let _ = writeln!(request, "The class Javadoc must include: {}", tags.join(", "));
    }
    request
}

/// Read up to `limit` `*Test.java` files from `dir`, sorted by file name.
///
/// A missing directory or unreadable file is logged and contributes nothing.
pub async fn load_examples(dir: &Path, limit: usize) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "examples directory unavailable");
            return Vec::new();
        }
    };

    let mut paths = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.ends_with(EXAMPLE_SUFFIX))
                {
                    paths.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to list examples");
                break;
            }
        }
    }
    paths.sort();

    let mut examples = Vec::with_capacity(limit.min(paths.len()));
    for path in paths.into_iter().take(limit) {
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => examples.push(content),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping example"),
        }
    }
    examples
}
