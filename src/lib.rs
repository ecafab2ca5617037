//! # pdf2md-batch
//!
//! Convert a directory of PDF documents into Markdown files, optionally
//! sanitized for line-delimited formats, and collect the results into a JSONL
//! dataset.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source_dir/*.pdf
//!  │
//!  ├─ 1. Destination  create dest_dir (fatal on failure)
//!  ├─ 2. Discover     list *.pdf, sorted by name (fatal on failure)
//!  ├─ 3. Convert      engine → text, one file at a time
//!  ├─ 4. Sanitize     optional allowlist filter
//!  └─ 5. Write        dest_dir/<stem>.md, atomically
//!
//! dest_dir/*.md ──▶ dataset.jsonl   (optional LLM invoice extraction)
//! ```
//!
//! A failure in steps 3–5 is confined to its file: it is logged, recorded in
//! the [`BatchSummary`], and the loop continues.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_batch::{convert_directory, BatchConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .source_dir("invoices")
//!         .dest_dir("markdown")
//!         .build()?;
//!     let summary = convert_directory(&config)?;
//!     eprintln!("{}/{} converted", summary.converted_count(), summary.total());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-batch` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{convert_directory, convert_directory_with, convert_one, run_batch};
pub use config::{BatchConfig, BatchConfigBuilder, DatasetConfig, DatasetConfigBuilder};
pub use dataset::{build_dataset, run_dataset, InvoiceExtractor, LlmExtractor};
pub use engine::{
    ConversionEngine, DocumentConverter, MarkdownEngine, MarkdownEngineBuilder, PluginConverter,
};
pub use error::{BatchError, EngineError, FileError};
pub use output::{
    BatchSummary, ConversionResult, DatasetRecord, DatasetSummary, FileOutcome, InvoiceFields,
    SkippedFile,
};
pub use pipeline::input::{ensure_destination, list_inputs, SourceFile};
pub use pipeline::sanitize::sanitize;
pub use pipeline::text::PlainTextConverter;
pub use pipeline::write::write_output;
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
