mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use testgen_core::config::{Config, ProviderKind};
use testgen_core::{GeneratorSettings, TestGenerator};
use testgen_llm::AnyProvider;
use testgen_llm::ollama::OllamaProvider;
use testgen_llm::openai::OpenAiProvider;
use testgen_rag::{IngestReport, PdfLoader, RagPipeline, SourceLoader, TextLoader};

/// Generate unit tests grounded in your own documents and code.
#[derive(Parser)]
#[command(name = "testgen", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "TESTGEN_CONFIG", default_value = "config/default.toml")]
    config: PathBuf,

    /// Files or directories to ingest. Defaults to `paths.input_dir`.
    #[arg(long = "source", short = 's', global = true)]
    sources: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest sources and print the index report.
    Ingest,

    /// Ask a free-form question against the ingested sources.
    Ask { question: String },

    /// Generate a JUnit test from requirements, using example tests as style guides.
    Generate {
        requirements: String,
        /// Print the test instead of writing it to `paths.output_dir`.
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate a documented test class from a description and method list.
    Docs {
        /// Description of the class under test.
        #[arg(long = "class")]
        class_desc: String,
        /// Test methods as `name=description`, in order.
        #[arg(long = "method", value_parser = parse_method)]
        methods: Vec<(String, String)>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate one documented test class per entry of a JSON test-case file.
    Cases { file: PathBuf },

    /// Generate tests for every endpoint of an OpenAPI document.
    Openapi { file: PathBuf },

    /// Describe a curl command as a test request, optionally generating the test.
    Curl {
        command: String,
        #[arg(long)]
        generate: bool,
    },

    /// Write a JSON report of the Java test sources in a directory.
    Analyze {
        /// Defaults to `paths.examples_dir`.
        dir: Option<PathBuf>,
    },
}

fn parse_method(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, desc)| (name.trim().to_owned(), desc.trim().to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected name=description, got {raw:?}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    config.validate()?;
    tracing::debug!(config = ?config, "configuration loaded");

    let sources = if cli.sources.is_empty() {
        vec![config.paths.input_dir.clone()]
    } else {
        cli.sources
    };

    run(cli.command, &config, &sources).await
}

async fn run(command: Command, config: &Config, sources: &[PathBuf]) -> anyhow::Result<()> {
    let out = &config.paths.output_dir;
    match command {
        Command::Analyze { dir } => {
            let dir = dir.unwrap_or_else(|| config.paths.examples_dir.clone());
            commands::analyze(config, &dir).await
        }
        Command::Curl {
            command,
            generate: false,
        } => commands::describe_curl(&command),
        Command::Ingest => {
            let (_, report) = prepare(config, sources).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Ask { question } => {
            let (generator, _) = prepare(config, sources).await?;
            commands::ask(&generator, &question).await
        }
        Command::Generate {
            requirements,
            dry_run,
        } => {
            let (generator, _) = prepare(config, sources).await?;
            commands::generate(&generator, &requirements, (!dry_run).then_some(out.as_path()))
                .await
        }
        Command::Docs {
            class_desc,
            methods,
            dry_run,
        } => {
            let (generator, _) = prepare(config, sources).await?;
            commands::docs(&generator, &class_desc, methods, (!dry_run).then_some(out.as_path()))
                .await
        }
        Command::Cases { file } => {
            let (generator, _) = prepare(config, sources).await?;
            commands::cases(&generator, &file, out).await
        }
        Command::Openapi { file } => {
            let (generator, _) = prepare(config, sources).await?;
            commands::openapi(&generator, &file, out).await
        }
        Command::Curl {
            command,
            generate: true,
        } => {
            let (generator, _) = prepare(config, sources).await?;
            commands::curl(&generator, &command, out).await
        }
    }
}

/// Build the generator and ingest `sources` into its index.
async fn prepare(
    config: &Config,
    sources: &[PathBuf],
) -> anyhow::Result<(TestGenerator<AnyProvider>, IngestReport)> {
    let generator = build_generator(config).await?;
    let report = generator
        .pipeline()
        .ingest(sources)
        .await
        .context("ingestion failed")?;
    tracing::info!(
        units = report.units,
        chunks = report.chunks,
        indexed = report.indexed,
        skipped = report.skipped,
        "sources ingested"
    );
    Ok((generator, report))
}

async fn build_generator(config: &Config) -> anyhow::Result<TestGenerator<AnyProvider>> {
    let provider = create_provider(config)?;
    health_check(&provider).await;

    let embed = provider.embed_fn();
    let pipeline = RagPipeline::new(Arc::new(provider), embed, config.rag_settings())?
        .with_template(config.prompt_template()?)
        .with_loader(build_loader(config));
    Ok(TestGenerator::new(
        Arc::new(pipeline),
        GeneratorSettings::from(config),
    ))
}

fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    match llm.provider {
        ProviderKind::Ollama => Ok(AnyProvider::Ollama(OllamaProvider::new(
            &llm.base_url,
            llm.model.clone(),
            llm.embedding_model.clone(),
        ))),
        ProviderKind::OpenAi => {
            let api_key = llm
                .api_key
                .clone()
                .context("TESTGEN_API_KEY is required for the openai provider")?;
            Ok(AnyProvider::OpenAi(OpenAiProvider::new(
                api_key,
                llm.base_url.clone(),
                llm.model.clone(),
                llm.max_tokens,
                Some(llm.embedding_model.clone()),
            )))
        }
    }
}

async fn health_check(provider: &AnyProvider) {
    if let AnyProvider::Ollama(ollama) = provider {
        match ollama.health_check().await {
            Ok(()) => tracing::info!("ollama health check passed"),
            Err(e) => tracing::warn!("ollama health check failed: {e:#}"),
        }
    }
}

fn build_loader(config: &Config) -> SourceLoader {
    let text = TextLoader {
        max_file_size: config.rag.max_file_size_bytes(),
    };
    SourceLoader::new(text, build_pdf_loader(config))
}

#[cfg(feature = "pdf")]
fn build_pdf_loader(config: &Config) -> Option<PdfLoader> {
    use testgen_rag::{OcrFallback, PdftoppmRasterizer, TesseractOcr};

    let pdf = PdfLoader::default().with_max_file_size(config.rag.max_file_size_bytes());
    if !config.ocr.enabled {
        return Some(pdf);
    }
    let ocr = OcrFallback::new(
        Arc::new(PdftoppmRasterizer::new(config.ocr.pdftoppm_command.as_str())),
        Arc::new(TesseractOcr::new(
            config.ocr.tesseract_command.as_str(),
            config.ocr.language.as_str(),
        )),
    )
    .with_dpi(config.rag.ocr_dpi)
    .with_max_pages(config.rag.ocr_max_pages);
    Some(pdf.with_ocr(ocr))
}

#[cfg(not(feature = "pdf"))]
fn build_pdf_loader(_config: &Config) -> Option<PdfLoader> {
    tracing::debug!("built without PDF support");
    None
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
