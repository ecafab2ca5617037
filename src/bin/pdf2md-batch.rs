//! CLI binary for pdf2md-batch.
//!
//! A thin shim over the library crate that maps subcommand flags to
//! `BatchConfig` / `DatasetConfig` and prints a summary.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_batch::config::{DEFAULT_DATASET_PATH, DEFAULT_DEST_DIR, DEFAULT_SOURCE_DIR};
use pdf2md_batch::{
    build_dataset, convert_directory, BatchConfig, BatchProgressCallback, BatchSummary,
    DatasetConfig, DatasetSummary, PlainTextConverter, ProgressCallback,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar with one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    file_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Listing source directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            file_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.file_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_files as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Found {total_files} files to convert…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, file_name: &str) {
        if let Ok(mut t) = self.file_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(file_name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, output: &Path) {
        let name = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, file_name: &str, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index + 1,
            total,
            file_name,
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();
        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert ../dataset/originalData/*.pdf into ../dataset/mdData/
  pdf2md-batch convert

  # Explicit directories, sanitized single-line output
  pdf2md-batch convert --source invoices --dest markdown --sanitize

  # Normalise a directory of text files through the plain-text plugin
  pdf2md-batch convert --extension txt --enable-plugins --source notes --dest md

  # Fail the process if any file failed
  pdf2md-batch convert --strict

  # Build a JSONL dataset from the Markdown
  pdf2md-batch dataset --input markdown --output dataset.jsonl

  # ... with LLM invoice-field extraction on the first 5 files
  pdf2md-batch dataset --extract --limit 5 --model gpt-4.1-nano

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise the system library is used)
  OPENAI_API_KEY          OpenAI API key (dataset --extract)
  ANTHROPIC_API_KEY       Anthropic API key (dataset --extract)
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Override the log filter
"#;

/// Batch-convert PDF directories to Markdown and build JSONL datasets.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-batch",
    version,
    about = "Batch-convert a directory of PDFs to Markdown",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert every PDF in a directory to a Markdown file.
    Convert(ConvertArgs),
    /// Build a JSONL dataset from a directory of Markdown files.
    Dataset(DatasetArgs),
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MD_QUIET")]
    quiet: bool,

    /// Print the summary as JSON on stdout.
    #[arg(long, env = "PDF2MD_JSON")]
    json: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Directory containing the PDFs.
    #[arg(long, env = "PDF2MD_SOURCE", default_value = DEFAULT_SOURCE_DIR)]
    source: PathBuf,

    /// Directory receiving the Markdown files. Created if absent.
    #[arg(long, env = "PDF2MD_DEST", default_value = DEFAULT_DEST_DIR)]
    dest: PathBuf,

    /// Flatten output to one sanitized line per file.
    #[arg(long, env = "PDF2MD_SANITIZE")]
    sanitize: bool,

    /// Enable plugin converters (plain text: .txt, .md, .markdown).
    #[arg(long, env = "PDF2MD_ENABLE_PLUGINS")]
    enable_plugins: bool,

    /// Process files in directory order instead of sorted by name.
    #[arg(long, env = "PDF2MD_NO_SORT")]
    no_sort: bool,

    /// Input file extension (case-insensitive).
    #[arg(long, env = "PDF2MD_EXTENSION", default_value = "pdf")]
    extension: String,

    /// Exit with an error if any file failed.
    #[arg(long, env = "PDF2MD_STRICT")]
    strict: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2MD_NO_PROGRESS")]
    no_progress: bool,

    #[command(flatten)]
    log: LogArgs,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Directory containing the Markdown files.
    #[arg(long, env = "PDF2MD_DATASET_INPUT", default_value = DEFAULT_DEST_DIR)]
    input: PathBuf,

    /// JSONL file to write.
    #[arg(long, env = "PDF2MD_DATASET_OUTPUT", default_value = DEFAULT_DATASET_PATH)]
    output: PathBuf,

    /// Process at most N files.
    #[arg(long, env = "PDF2MD_LIMIT",
          value_parser = clap::value_parser!(u64).range(1..))]
    limit: Option<u64>,

    /// Ask an LLM for invoice fields on every record.
    #[arg(long, env = "PDF2MD_EXTRACT")]
    extract: bool,

    /// LLM model ID (e.g. gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDF2MD_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Retries per file on LLM failure.
    #[arg(long, env = "PDF2MD_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2MD_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens per file.
    #[arg(long, env = "PDF2MD_MAX_TOKENS", default_value_t = 512)]
    max_tokens: usize,

    #[command(flatten)]
    log: LogArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => run_convert(args).await,
        Command::Dataset(args) => run_dataset(args).await,
    }
}

/// Install the tracing subscriber. INFO logs are suppressed while the
/// progress bar is active; `--verbose` always wins.
fn init_logging(log: &LogArgs, show_progress: bool) {
    let filter = if log.verbose {
        "debug"
    } else if log.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

async fn run_convert(args: ConvertArgs) -> Result<()> {
    let show_progress = !args.log.quiet && !args.no_progress && !args.log.json;
    init_logging(&args.log, show_progress);

    let mut builder = BatchConfig::builder()
        .source_dir(&args.source)
        .dest_dir(&args.dest)
        .input_extension(&args.extension)
        .sanitize(args.sanitize)
        .enable_plugins(args.enable_plugins)
        .plugin(Arc::new(PlainTextConverter))
        .sort_inputs(!args.no_sort);
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // pdfium calls are blocking; keep them off the async worker's hot path.
    let summary = tokio::task::block_in_place(|| convert_directory(&config))
        .context("Conversion failed")?;

    if args.log.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !args.log.quiet {
        print_batch_summary(&summary, &args.dest, show_progress);
    }

    if args.strict {
        summary.into_result().context("Some files failed")?;
    }
    Ok(())
}

fn print_batch_summary(summary: &BatchSummary, dest: &Path, show_progress: bool) {
    if !show_progress {
        eprintln!(
            "Converted {}/{} files in {}ms",
            summary.converted_count(),
            summary.total(),
            summary.duration_ms
        );
        for (source, error) in summary.failures() {
            eprintln!("  {} {}: {}", red("✗"), source.display(), error);
        }
    } else {
        eprintln!(
            "{}  {}ms  →  {}",
            if summary.failed_count() == 0 { green("✔") } else { cyan("⚠") },
            summary.duration_ms,
            bold(&dest.display().to_string()),
        );
    }
}

async fn run_dataset(args: DatasetArgs) -> Result<()> {
    init_logging(&args.log, false);

    let system_prompt = if let Some(ref path) = args.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = DatasetConfig::builder()
        .input_dir(&args.input)
        .output_path(&args.output)
        .extract(args.extract)
        .max_retries(args.max_retries)
        .temperature(args.temperature)
        .max_tokens(args.max_tokens);
    if let Some(n) = args.limit {
        builder = builder.limit(usize::try_from(n).unwrap_or(usize::MAX));
    }
    if let Some(ref m) = args.model {
        builder = builder.model(m);
    }
    if let Some(ref p) = args.provider {
        builder = builder.provider_name(p);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    let config = builder.build().context("Invalid configuration")?;

    let summary = build_dataset(&config)
        .await
        .context("Dataset build failed")?;

    if args.log.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !args.log.quiet {
        print_dataset_summary(&summary);
    }
    Ok(())
}

fn print_dataset_summary(summary: &DatasetSummary) {
    eprintln!(
        "{}  {} records  {}ms  →  {}",
        if summary.skipped.is_empty() { green("✔") } else { cyan("⚠") },
        summary.records,
        summary.duration_ms,
        bold(&summary.output.display().to_string()),
    );
    if summary.extracted > 0 {
        eprintln!(
            "   {} with invoice fields",
            dim(&summary.extracted.to_string())
        );
    }
    for skipped in &summary.skipped {
        eprintln!("  {} {}: {}", red("✗"), skipped.source.display(), skipped.error);
    }
}
