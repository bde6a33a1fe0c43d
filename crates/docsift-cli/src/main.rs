use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docsift_core::config_file::{self, ConfigFile};
use docsift_core::{EmbeddingConfig, EmbeddingProvider, build_embedder};
use docsift_ingest::{AnalysisError, AnalysisRequest, Analyzer, default_span_source};
use docsift_parsing::{Segmenter, body_font_size};
use docsift_reporting::{ExportFormat, export_report};

mod output;

use output::ColorMode;

const DEFAULT_INPUT: &str = "input/input.json";
const DEFAULT_PDF_DIR: &str = "input/pdfs";
const DEFAULT_OUTPUT: &str = "output/output.json";

/// Persona-driven document analysis - Extract the PDF sections that matter for a task
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank the sections of a document collection for a persona and task
    Analyze {
        /// Request JSON (documents, persona, job to be done) [default: input/input.json]
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory holding the request's PDFs [default: input/pdfs]
        #[arg(long)]
        pdf_dir: Option<PathBuf>,

        /// Report path [default: output/output.json]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format: json, markdown or text
        #[arg(long, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// TOML config file (replaces the platform and ./.docsift.toml cascade)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Embedding provider: fastembed (local all-MiniLM-L6-v2), hash, openai or ollama
        #[arg(long)]
        provider: Option<EmbeddingProvider>,

        /// Embedding model name
        #[arg(long)]
        model: Option<String>,

        /// Base URL of the embedding API
        #[arg(long)]
        api_base: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dry run: print the detected sections of a single PDF
    Sections {
        /// Path to the PDF
        file_path: PathBuf,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            input,
            pdf_dir,
            output,
            format,
            config,
            provider,
            model,
            api_base,
            no_color,
        } => {
            let file = load_config_file(config.as_deref())?;
            let paths = file.paths.clone().unwrap_or_default();
            let flags = EmbeddingFlags {
                provider,
                model,
                api_base,
            };
            let embedding = resolve_embedding_config(&flags, &file, |k| std::env::var(k).ok());

            analyze(
                input.unwrap_or_else(|| or_default(paths.input, DEFAULT_INPUT)),
                pdf_dir.unwrap_or_else(|| or_default(paths.pdf_dir, DEFAULT_PDF_DIR)),
                output.unwrap_or_else(|| or_default(paths.output, DEFAULT_OUTPUT)),
                format,
                &file,
                &embedding,
                ColorMode(!no_color),
            )
        }
        Command::Sections {
            file_path,
            config,
            no_color,
        } => {
            let file = load_config_file(config.as_deref())?;
            sections(&file_path, &file, ColorMode(!no_color))
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `docsift=info`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsift=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn or_default(value: Option<String>, default: &str) -> PathBuf {
    PathBuf::from(value.unwrap_or_else(|| default.to_string()))
}

fn load_config_file(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    match explicit {
        Some(path) => config_file::load_from_path(path)
            .with_context(|| format!("Could not load config file {}", path.display())),
        None => Ok(config_file::load_config()),
    }
}

#[derive(Debug, Default)]
struct EmbeddingFlags {
    provider: Option<EmbeddingProvider>,
    model: Option<String>,
    api_base: Option<String>,
}

/// Resolve the embedding backend: CLI flags > env vars > config file >
/// provider defaults. File values for model and API base only apply when
/// the file names the same provider (or none).
fn resolve_embedding_config(
    flags: &EmbeddingFlags,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> EmbeddingConfig {
    let section = file.embedding.clone().unwrap_or_default();

    let env_provider = env("DOCSIFT_EMBED_PROVIDER").and_then(|v| match v.parse() {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(value = %v, error = %e, "ignoring DOCSIFT_EMBED_PROVIDER");
            None
        }
    });
    let provider = flags
        .provider
        .or(env_provider)
        .or(section.provider)
        .unwrap_or_default();

    let file_applies = section.provider.is_none_or(|p| p == provider);
    let file_config = file.embedding_config();
    let defaults = EmbeddingConfig::for_provider(provider);

    let (file_model, file_base) = if file_applies {
        (section.model, section.api_base)
    } else {
        (None, None)
    };

    let api_key = env("DOCSIFT_EMBED_API_KEY")
        .or_else(|| {
            (provider == EmbeddingProvider::OpenAi)
                .then(|| env("OPENAI_API_KEY"))
                .flatten()
        })
        .or(section.api_key);

    EmbeddingConfig {
        provider,
        model: flags
            .model
            .clone()
            .or_else(|| env("DOCSIFT_EMBED_MODEL"))
            .or(file_model)
            .unwrap_or(defaults.model),
        api_base: flags
            .api_base
            .clone()
            .or_else(|| env("DOCSIFT_EMBED_API_BASE"))
            .or(file_base)
            .unwrap_or(defaults.api_base),
        api_key,
        dimensions: file_config.dimensions,
        timeout: file_config.timeout,
    }
}

fn analyze(
    input: PathBuf,
    pdf_dir: PathBuf,
    output_path: PathBuf,
    format: ExportFormat,
    file: &ConfigFile,
    embedding: &EmbeddingConfig,
    color: ColorMode,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let config = file.analysis_config().context("Invalid [analysis] configuration")?;
    let request = AnalysisRequest::load(&input)?.with_pdf_dir(&pdf_dir);
    let embedder = build_embedder(embedding)?;
    let spans = default_span_source()?;

    let analyzer = Analyzer::new(spans.as_ref(), embedder.as_ref(), config);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Reading {} documents...", request.documents.len()));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let start = Instant::now();
    let result = analyzer.analyze(&request, |event| {
        if let Some(line) = output::progress_line(&event, color) {
            spinner.println(line);
        }
        spinner.set_message(output::stage_message(&event));
    });
    spinner.finish_and_clear();

    let mut stdout = std::io::stdout();
    let report = match result {
        Ok(report) => report,
        Err(AnalysisError::EmptyCorpus) => {
            output::print_empty_corpus(&mut stdout, color)?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    export_report(&report, format, &output_path)?;
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        sections = report.extracted_sections.len(),
        subsections = report.subsection_analysis.len(),
        "analysis complete"
    );
    output::print_summary(&mut stdout, &report, &output_path, color)?;
    Ok(())
}

fn sections(file_path: &Path, file: &ConfigFile, color: ColorMode) -> anyhow::Result<()> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }

    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let config = file.analysis_config().context("Invalid [analysis] configuration")?;
    let layout = default_span_source()?.open_document(file_path)?;
    let body_size = body_font_size(&layout, config.default_body_font_size());
    let sections = Segmenter::with_config(config).segment(&layout, &file_name);

    output::print_sections(
        &mut std::io::stdout(),
        &file_name,
        body_size,
        &sections,
        color,
    )?;
    Ok(())
}
