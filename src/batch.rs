//! Directory-to-directory batch conversion.
//!
//! Files are processed strictly one at a time in listing order. Each file's
//! convert → (sanitize) → write sequence is a unit: any failure inside it is
//! recorded as a [`FileOutcome::Failed`], logged, and the loop moves on. Only
//! failures outside that unit (destination creation, source listing, engine
//! binding) end the run with a [`BatchError`].

use crate::config::BatchConfig;
use crate::engine::{ConversionEngine, DocumentConverter, MarkdownEngine};
use crate::error::{BatchError, FileError};
use crate::output::{BatchSummary, ConversionResult, FileOutcome};
use crate::pipeline::input::{self, SourceFile};
use crate::pipeline::pdf::PdfiumConverter;
use crate::pipeline::{sanitize, write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every matching file in `config.source_dir` with the default
/// pdfium engine.
///
/// The engine is bound once and reused for all files.
///
/// # Errors
/// Returns `Err(BatchError)` only for fatal errors:
/// - pdfium cannot be bound
/// - destination cannot be created
/// - source directory cannot be listed
///
/// Individual file failures are reported in the returned [`BatchSummary`].
pub fn convert_directory(config: &BatchConfig) -> Result<BatchSummary, BatchError> {
    convert_directory_with(Box::new(PdfiumConverter::bind()?), config)
}

/// Like [`convert_directory`], with `builtin` in place of pdfium.
///
/// The engine is assembled from `builtin` plus `config.plugins`, with
/// `config.enable_plugins` deciding whether the plugins are consulted.
pub fn convert_directory_with(
    builtin: Box<dyn DocumentConverter>,
    config: &BatchConfig,
) -> Result<BatchSummary, BatchError> {
    let engine = MarkdownEngine::builder()
        .builtin(builtin)
        .configure(config)
        .build();
    debug!(
        "Engine ready: {} plugins, plugins {}",
        config.plugins.len(),
        if engine.plugins_enabled() { "enabled" } else { "disabled" }
    );
    run_batch(&engine, config)
}

/// Run the batch loop with a caller-supplied engine.
///
/// The engine is used as given: `config.plugins` and `config.enable_plugins`
/// only take effect when the engine was built with
/// [`crate::engine::MarkdownEngineBuilder::configure`].
pub fn run_batch(
    engine: &dyn ConversionEngine,
    config: &BatchConfig,
) -> Result<BatchSummary, BatchError> {
    let start = Instant::now();

    // ── Step 1: Destination ──────────────────────────────────────────────
    input::ensure_destination(&config.dest_dir)?;

    // ── Step 2: Discover inputs ──────────────────────────────────────────
    let inputs = input::list_inputs(
        &config.source_dir,
        &config.input_extension,
        config.sort_inputs,
    )?;
    let total = inputs.len();
    info!(
        "Found {} {} files to convert...",
        total,
        config.input_extension.to_uppercase()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 3: Per-file loop ────────────────────────────────────────────
    let mut outcomes = Vec::with_capacity(total);
    for (index, source) in inputs.iter().enumerate() {
        let file_name = source.file_name();
        info!("Converting: {}", file_name);
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &file_name);
        }

        let outcome = match process_file(engine, source, config) {
            Ok((output, chars)) => {
                info!("✓ Saved: {}", display_name(&output));
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, &output);
                }
                FileOutcome::Converted {
                    source: source.path().to_path_buf(),
                    output,
                    chars,
                }
            }
            Err(error) => {
                warn!("✗ {}", error);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(index, total, &file_name, &error.to_string());
                }
                FileOutcome::Failed {
                    source: source.path().to_path_buf(),
                    error,
                }
            }
        };
        outcomes.push(outcome);
    }

    let summary = BatchSummary {
        outcomes,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete! {}/{} files, {}ms",
        summary.converted_count(),
        total,
        summary.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, summary.converted_count());
    }

    Ok(summary)
}

/// Convert one file through the engine, wrapping the failure with its name.
pub fn convert_one(
    engine: &dyn ConversionEngine,
    source: &SourceFile,
) -> Result<ConversionResult, FileError> {
    engine
        .convert(source.path())
        .map_err(|e| FileError::Conversion {
            file: source.file_name(),
            source: e,
        })
}

/// The per-file unit: convert, optionally sanitize, write.
///
/// Returns the output path and the character count written.
fn process_file(
    engine: &dyn ConversionEngine,
    source: &SourceFile,
    config: &BatchConfig,
) -> Result<(PathBuf, usize), FileError> {
    let result = convert_one(engine, source)?;

    let text = if config.sanitize {
        let cleaned = sanitize::sanitize(&result.text_content);
        debug!(
            "{}: sanitized {} → {} chars",
            source.file_name(),
            result.text_content.chars().count(),
            cleaned.chars().count()
        );
        cleaned
    } else {
        result.text_content
    };

    let output = write::write_output(&config.dest_dir, source, &text, &config.output_extension)?;
    Ok((output, text.chars().count()))
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
