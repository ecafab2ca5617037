//! Error types for the pdf2md-batch library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`BatchError`] — **Fatal**: the run cannot proceed at all (destination
//!   cannot be created, source directory cannot be listed, PDFium cannot be
//!   bound). Returned as `Err(BatchError)` from the top-level entry points.
//!
//! * [`FileError`] — **Non-fatal**: a single file failed (corrupt PDF,
//!   write error) but every other file is fine. Stored inside
//!   [`crate::output::FileOutcome::Failed`] so callers can inspect partial
//!   success rather than losing the whole batch to one bad document.
//!
//! * [`EngineError`] — what a conversion engine reports for one document.
//!   Always wrapped in [`FileError::Conversion`] by the batch loop.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2md-batch library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::FileOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum BatchError {
    // ── Directory errors ──────────────────────────────────────────────────
    /// The destination directory tree could not be created.
    #[error("Failed to create destination directory '{path}': {source}")]
    DestinationCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source directory could not be listed.
    #[error("Failed to list source directory '{path}': {source}\nCheck the path exists and is readable.")]
    SourceListFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, or set PDFIUM_LIB_PATH=/path/to/libpdfium\n\
to point at an existing copy.\n"
    )]
    EngineUnavailable(String),

    // ── Dataset errors ────────────────────────────────────────────────────
    /// The configured LLM provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The JSONL dataset could not be written.
    #[error("Failed to write dataset '{path}': {source}")]
    DatasetWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Summary errors ────────────────────────────────────────────────────
    /// Some files converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchSummary::into_result`] when the
    /// caller wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed during conversion")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// The batch continues with the next file after recording one of these.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum FileError {
    /// The conversion engine could not produce text for the document.
    #[error("Error converting {file}: {source}")]
    Conversion {
        file: String,
        #[source]
        source: EngineError,
    },

    /// The output file could not be written.
    #[error("Failed to write '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    /// An input file could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// Invoice-field extraction failed after retries, or its reply was not
    /// valid JSON.
    #[error("{file}: extraction failed after {retries} retries: {detail}")]
    ExtractionFailed {
        file: String,
        retries: u32,
        detail: String,
    },
}

/// Failure reported by a conversion engine for one document.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum EngineError {
    /// No registered converter accepts this file.
    #[error("no converter accepts '{path}'")]
    Unsupported { path: PathBuf },

    /// Header/trailer/xref is corrupt and the document cannot be opened.
    #[error("'{path}' is corrupt: {detail}")]
    Corrupt { path: PathBuf, detail: String },

    /// The document is encrypted.
    #[error("'{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// Text extraction failed on a specific page.
    #[error("text extraction failed on page {page} of '{path}': {detail}")]
    TextExtraction {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// A plugin converter reported an error.
    #[error("plugin '{name}' failed: {detail}")]
    Plugin { name: String, detail: String },
}
