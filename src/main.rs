use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use futures::future::join_all;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use dependi_gradle::config::{Config, FileMatcher};
use dependi_gradle::extract::{Extractor, SourceFile, extract_all_package_files};
use dependi_gradle::file_types::FileKind;
use dependi_gradle::parsers::Variables;
use dependi_gradle::reports::{generate_json_report, generate_markdown_report, generate_summary};

#[derive(Parser)]
#[command(name = "dependi-gradle")]
#[command(about = "Extract dependencies from Gradle builds", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Summary,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dependencies from a Gradle project directory or a single file
    Extract {
        /// Project directory or Gradle file
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        output: OutputFormat,

        /// Config file (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Profile extraction of one file (for use with cargo-flamegraph)
    ProfileParse {
        /// Path to the Gradle file to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Number of iterations (for meaningful profiling)
        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Extract {
            path,
            output,
            config,
        } => match run_extract(&path, output, config.as_deref()).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::ProfileParse { file, iterations } => run_profile_parse(file, iterations).await,
    }
}

/// Relative paths of the files to extract, plus the directory they are relative to
fn collect_files(path: &Path, matcher: &FileMatcher) -> anyhow::Result<(PathBuf, Vec<PathBuf>)> {
    if path.is_file() {
        let root = path.parent().unwrap_or(Path::new("")).to_path_buf();
        let name = path.file_name().context("path has no file name")?;
        return Ok((root, vec![PathBuf::from(name)]));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(&e.file_name().to_string_lossy()))
    {
        let entry = entry.with_context(|| format!("failed to walk {}", path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(path)?.to_path_buf();
        if matcher.matches(&relative) {
            files.push(relative);
        }
    }
    Ok((path.to_path_buf(), files))
}

fn is_skipped_dir(name: &str) -> bool {
    matches!(name, ".git" | ".gradle" | "build" | "node_modules")
}

async fn run_extract(
    path: &Path,
    output: OutputFormat,
    config_path: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let config = Config::load_or_default(config_path)?;
    let matcher = config.files.matcher()?;
    let (root, paths) = collect_files(path, &matcher)?;

    let reads = paths.iter().map(|relative| {
        let full = root.join(relative);
        async move { tokio::fs::read_to_string(&full).await }
    });
    let mut files = Vec::with_capacity(paths.len());
    for (relative, result) in paths.iter().zip(join_all(reads).await) {
        match result {
            Ok(content) => files.push(SourceFile::new(relative.clone(), content)),
            Err(e) => tracing::warn!("Failed to read {}: {e}", relative.display()),
        }
    }

    if files.is_empty() {
        eprintln!("No readable Gradle files found in {}", path.display());
        return Ok(ExitCode::FAILURE);
    }

    let report = extract_all_package_files(&config, &files);
    let rendered = match output {
        OutputFormat::Summary => generate_summary(&report),
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Markdown => generate_markdown_report(&root, &report),
    };
    println!("{rendered}");

    Ok(ExitCode::SUCCESS)
}

async fn run_profile_parse(file: PathBuf, iterations: usize) -> ExitCode {
    let content = match tokio::fs::read_to_string(&file).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading file: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(kind) = FileKind::detect(&file) else {
        eprintln!("Unsupported file type: {}", file.display());
        return ExitCode::FAILURE;
    };

    eprintln!("Profiling parse operations for: {}", file.display());
    eprintln!("Iterations: {iterations}");
    eprintln!("File size: {} bytes", content.len());

    let extractor = Extractor::new(&Config::default());
    let variables = Variables::new();
    let start = Instant::now();

    for _ in 0..iterations {
        let result = extractor.parse_file(kind, &content, &variables, &file);
        std::hint::black_box(result.ok());
    }

    let elapsed = start.elapsed();
    eprintln!("\nProfiling complete!");
    eprintln!("Total time: {elapsed:?}");
    eprintln!(
        "Average per iteration: {:?}",
        elapsed / iterations.max(1) as u32
    );

    ExitCode::SUCCESS
}
