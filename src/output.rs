//! Result types returned by the batch and dataset entry points.

use crate::error::{BatchError, FileError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Text extracted from one document by a conversion engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Markdown-formatted text content.
    pub text_content: String,
}

impl ConversionResult {
    pub fn new(text_content: impl Into<String>) -> Self {
        Self {
            text_content: text_content.into(),
        }
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Output written.
    Converted {
        source: PathBuf,
        output: PathBuf,
        /// Character count of the written text.
        chars: usize,
    },
    /// Conversion or write failed; no output exists for this source.
    Failed { source: PathBuf, error: FileError },
}

impl FileOutcome {
    pub fn source(&self) -> &PathBuf {
        match self {
            FileOutcome::Converted { source, .. } | FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }

    pub fn error(&self) -> Option<&FileError> {
        match self {
            FileOutcome::Failed { error, .. } => Some(error),
            FileOutcome::Converted { .. } => None,
        }
    }
}

/// Summary of a whole conversion run, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub outcomes: Vec<FileOutcome>,
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn converted_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_converted()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.total() - self.converted_count()
    }

    /// Iterate over the failures only.
    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &FileError)> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Failed { source, error } => Some((source, error)),
            FileOutcome::Converted { .. } => None,
        })
    }

    /// Treat any failed file as an error.
    pub fn into_result(self) -> Result<BatchSummary, BatchError> {
        let failed = self.failed_count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(BatchError::PartialFailure {
                success: self.converted_count(),
                failed,
                total: self.total(),
            })
        }
    }
}

/// Invoice fields extracted from a Markdown document. Every field is
/// `None` when the model could not find it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFields {
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_location: Option<String>,
}

/// One line of the JSONL dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Markdown file name.
    pub source: String,
    /// File stem.
    pub title: String,
    /// Sanitized, single-line text.
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

/// A file the dataset builder could not include.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub source: PathBuf,
    pub error: FileError,
}

/// Summary of a dataset build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub output: PathBuf,
    pub records: usize,
    /// Records whose invoice extraction succeeded.
    pub extracted: usize,
    pub skipped: Vec<SkippedFile>,
    pub duration_ms: u64,
}
