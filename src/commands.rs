use std::path::Path;

use anyhow::Context;
use testgen_core::config::Config;
use testgen_core::output::{save_as, write_json};
use testgen_core::{
    CurlRequest, GeneratedTest, MethodSpec, OpenApiDocument, TestGenerator, analyze_java_sources,
    load_test_cases, save_generated_test,
};
use testgen_llm::AnyProvider;

type Generator = TestGenerator<AnyProvider>;

pub(crate) async fn ask(generator: &Generator, question: &str) -> anyhow::Result<()> {
    let result = generator.pipeline().generate(question).await?;
    println!("{}", result.answer.trim());
    for chunk in &result.context {
        tracing::debug!(
            source = %chunk.metadata.source,
            chunk = chunk.chunk_index,
            "context chunk"
        );
    }
    Ok(())
}

pub(crate) async fn generate(
    generator: &Generator,
    requirements: &str,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let test = generator.generate_from_requirements(requirements).await?;
    emit(&test, out).await
}

pub(crate) async fn docs(
    generator: &Generator,
    class_desc: &str,
    methods: Vec<(String, String)>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let methods: Vec<MethodSpec> = methods
        .into_iter()
        .map(|(name, desc)| MethodSpec::new(name, desc))
        .collect();
    let test = generator.generate_with_docs(class_desc, &methods).await?;
    emit(&test, out).await
}

pub(crate) async fn cases(generator: &Generator, file: &Path, out: &Path) -> anyhow::Result<()> {
    let cases = load_test_cases(file).await?;
    let mut failed = 0usize;
    for case in &cases {
        match generator
            .generate_with_docs(&case.class_description, &case.method_specs())
            .await
        {
            Ok(test) => {
                let path = save_as(&test.code, out, &case.file_name()).await?;
                println!("{}", path.display());
            }
            Err(e) => {
                failed += 1;
                tracing::error!(case = %case.name, error = %e, "test case generation failed");
            }
        }
    }
    tracing::info!(total = cases.len(), failed, "test cases processed");
    Ok(())
}

pub(crate) async fn openapi(generator: &Generator, file: &Path, out: &Path) -> anyhow::Result<()> {
    let doc = OpenApiDocument::load(file).await?;
    let endpoints = doc.endpoints();
    if endpoints.is_empty() {
        tracing::warn!(path = %file.display(), "OpenAPI document has no operations");
    }

    let mut failed = 0usize;
    for endpoint in &endpoints {
        let plan = endpoint.test_plan();
        match generator
            .generate_with_docs(&plan.class_description, &plan.methods)
            .await
        {
            Ok(test) => {
                let path = save_as(&test.code, out, &endpoint.file_name()).await?;
                println!("{}", path.display());
            }
            Err(e) => {
                failed += 1;
                tracing::error!(
                    method = %endpoint.method,
                    path = %endpoint.path,
                    error = %e,
                    "endpoint test generation failed"
                );
            }
        }
    }
    tracing::info!(total = endpoints.len(), failed, "OpenAPI endpoints processed");
    Ok(())
}

pub(crate) fn describe_curl(command: &str) -> anyhow::Result<()> {
    let request = CurlRequest::parse(command)?;
    print!("{}", request.describe());
    Ok(())
}

pub(crate) async fn curl(generator: &Generator, command: &str, out: &Path) -> anyhow::Result<()> {
    let request = CurlRequest::parse(command)?;
    let test = generator
        .generate_from_requirements(&request.describe())
        .await?;
    emit(&test, Some(out)).await
}

pub(crate) async fn analyze(config: &Config, dir: &Path) -> anyhow::Result<()> {
    let reports = analyze_java_sources(dir)
        .await
        .with_context(|| format!("failed to analyze {}", dir.display()))?;
    let report_path = config.paths.output_dir.join("analysis_report.json");
    write_json(&reports, &report_path).await?;
    println!("{} ({} files)", report_path.display(), reports.len());
    Ok(())
}

async fn emit(test: &GeneratedTest, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(dir) => {
            let path = save_generated_test(&test.code, dir).await?;
            tracing::info!(
                class = test.info.class_name.as_deref().unwrap_or("-"),
                tests = test.info.test_methods.len(),
                context_chunks = test.context.len(),
                "test generated"
            );
            println!("{}", path.display());
        }
        None => println!("{}", test.code),
    }
    Ok(())
}
