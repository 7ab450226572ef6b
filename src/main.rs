//! CLI entry point for mdforge

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use mdforge::compiler::Compiler;
use mdforge::config::PipelineConfig;
use mdforge::content::FrontMatter;
use mdforge::document::CompiledDocument;
use mdforge::render::HtmlRenderer;

#[derive(Parser)]
#[command(name = "mdforge")]
#[command(version)]
#[command(about = "Compile Markdown/MDX content through a fixed plugin pipeline", long_about = None)]
struct Cli {
    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a file or directory to HTML or JSON
    #[command(alias = "c")]
    Compile {
        /// Source file or directory
        input: PathBuf,

        /// Output directory (stdout for single files when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output format (html or json)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Pipeline configuration file (TOML)
        #[arg(short, long)]
        pipeline: Option<PathBuf>,

        /// Syntax highlighting theme
        #[arg(short, long)]
        theme: Option<String>,
    },

    /// Validate source files without producing output
    Check {
        /// Source file or directory
        input: PathBuf,

        /// Pipeline configuration file (TOML)
        #[arg(short, long)]
        pipeline: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdforge=debug,info"
    } else {
        "mdforge=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Compile {
            input,
            out,
            format,
            pipeline,
            theme,
        } => {
            let format = parse_format(&format)?;
            let compiler = Arc::new(build_compiler(pipeline.as_deref(), theme.as_deref())?);

            if input.is_dir() {
                let out = out.unwrap_or_else(|| PathBuf::from("out"));
                compile_dir(compiler, &input, &out, format).await?;
            } else {
                compile_file(&compiler, &input, out.as_deref(), format)?;
            }
        }

        Commands::Check { input, pipeline } => {
            let compiler = build_compiler(pipeline.as_deref(), None)?;
            check(&compiler, &input)?;
            println!("All sources compiled cleanly");
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Html,
    Json,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    match format {
        "html" => Ok(OutputFormat::Html),
        "json" => Ok(OutputFormat::Json),
        other => bail!("unknown output format `{}` (expected html or json)", other),
    }
}

fn build_compiler(pipeline: Option<&Path>, theme: Option<&str>) -> Result<Compiler> {
    let config = match pipeline {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    tracing::debug!("pipeline: {}", config);

    Ok(match theme {
        Some(theme) => Compiler::with_theme(config, theme),
        None => Compiler::new(config),
    })
}

/// Compile one document: strip front matter, compile the body, emit.
fn compile_source(compiler: &Compiler, path: &Path) -> Result<CompiledDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {:?}", path))?;
    let (_, body) = FrontMatter::parse(&content)?;
    let document = compiler
        .compile(body)
        .with_context(|| format!("failed to compile {:?}", path))?;

    if !document.meta.degradations.is_empty() {
        tracing::debug!(
            "{:?}: {} degradation(s)",
            path,
            document.meta.degradations.len()
        );
    }
    Ok(document)
}

fn emit(document: &CompiledDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Html => Ok(HtmlRenderer::new().render(document)),
        OutputFormat::Json => Ok(document.to_json_pretty()?),
    }
}

fn compile_file(
    compiler: &Compiler,
    input: &Path,
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let document = compile_source(compiler, input)?;
    let rendered = emit(&document, format)?;

    match out {
        Some(dir) => {
            let target = output_path(dir, input, format);
            std::fs::create_dir_all(dir)?;
            std::fs::write(&target, rendered)
                .with_context(|| format!("failed to write {:?}", target))?;
            println!("Compiled {:?} -> {:?}", input, target);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

/// Compile every Markdown/MDX file under a directory. Each document is
/// independent, so the batch runs as parallel blocking tasks.
async fn compile_dir(
    compiler: Arc<Compiler>,
    input: &Path,
    out: &Path,
    format: OutputFormat,
) -> Result<()> {
    let files = collect_sources(input);
    if files.is_empty() {
        bail!("no Markdown/MDX files under {:?}", input);
    }
    std::fs::create_dir_all(out)?;

    let mut tasks = JoinSet::new();
    for path in files {
        let compiler = Arc::clone(&compiler);
        let target = output_path(out, &path, format);
        tasks.spawn_blocking(move || {
            let result = compile_source(&compiler, &path)
                .and_then(|doc| emit(&doc, format))
                .and_then(|rendered| {
                    std::fs::write(&target, rendered)
                        .with_context(|| format!("failed to write {:?}", target))
                });
            (path, result)
        });
    }

    let mut compiled = 0usize;
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        let (path, result) = joined.map_err(|e| anyhow!("compile task panicked: {}", e))?;
        match result {
            Ok(()) => compiled += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!("Failed to compile {:?}: {:#}", path, e);
            }
        }
    }

    println!("Compiled {} file(s), {} failed", compiled, failed);
    if failed > 0 {
        bail!("{} file(s) failed to compile", failed);
    }
    Ok(())
}

fn check(compiler: &Compiler, input: &Path) -> Result<()> {
    let files = if input.is_dir() {
        collect_sources(input)
    } else {
        vec![input.to_path_buf()]
    };
    if files.is_empty() {
        bail!("no Markdown/MDX files under {:?}", input);
    }

    let mut failed = 0usize;
    for path in &files {
        if let Err(e) = compile_source(compiler, path) {
            failed += 1;
            eprintln!("{:?}: {:#}", path, e);
        }
    }

    if failed > 0 {
        bail!("{} of {} file(s) failed to compile", failed, files.len());
    }
    Ok(())
}

fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "md" || e == "mdx" || e == "markdown")
                .unwrap_or(false)
        })
        .collect()
}

fn output_path(out: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled");
    out.join(format!("{}.{}", stem, format.extension()))
}
