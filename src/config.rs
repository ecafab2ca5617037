//! Configuration types for batch conversion and dataset building.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]; the JSONL stage uses [`DatasetConfig`] and
//! [`DatasetConfigBuilder`]. The defaults reproduce the directory layout the
//! tool was first written for: PDFs in `../dataset/originalData`, Markdown
//! in `../dataset/mdData`, the dataset next to them.

use crate::engine::PluginConverter;
use crate::error::BatchError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default directory scanned for PDFs.
pub const DEFAULT_SOURCE_DIR: &str = "../dataset/originalData";
/// Default directory receiving Markdown output.
pub const DEFAULT_DEST_DIR: &str = "../dataset/mdData";
/// Default JSONL dataset path.
pub const DEFAULT_DATASET_PATH: &str = "../dataset/dataset.jsonl";

/// Configuration for a directory-to-directory conversion run.
///
/// # Example
/// ```rust
/// use pdf2md_batch::BatchConfig;
///
/// let config = BatchConfig::builder()
///     .source_dir("pdfs")
///     .dest_dir("markdown")
///     .sanitize(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_extension, "md");
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory listed (non-recursively) for input documents.
    pub source_dir: PathBuf,

    /// Directory receiving one output file per converted input. Created if absent.
    pub dest_dir: PathBuf,

    /// Input extension without the dot, matched case-insensitively. Default: `pdf`.
    pub input_extension: String,

    /// Output extension without the dot. Default: `md`.
    pub output_extension: String,

    /// Pass each conversion result through the text sanitizer before writing.
    /// Default: false.
    ///
    /// Sanitized output is a single space-separated line: headings, lists and
    /// line breaks are flattened.
    pub sanitize: bool,

    /// Let [`BatchConfig::plugins`] take priority over the built-in
    /// converters. Default: false.
    pub enable_plugins: bool,

    /// Plugin converters, consulted in order before the built-ins when
    /// `enable_plugins` is set and ignored otherwise.
    pub plugins: Vec<PluginConverter>,

    /// Sort inputs lexicographically by file name. Default: true.
    ///
    /// Directory listing order is filesystem-dependent; sorting makes runs
    /// reproducible.
    pub sort_inputs: bool,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
            input_extension: "pdf".to_string(),
            output_extension: "md".to_string(),
            sanitize: false,
            enable_plugins: false,
            plugins: Vec::new(),
            sort_inputs: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("source_dir", &self.source_dir)
            .field("dest_dir", &self.dest_dir)
            .field("input_extension", &self.input_extension)
            .field("output_extension", &self.output_extension)
            .field("sanitize", &self.sanitize)
            .field("enable_plugins", &self.enable_plugins)
            .field(
                "plugins",
                &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("sort_inputs", &self.sort_inputs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source_dir = dir.into();
        self
    }

    pub fn dest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dest_dir = dir.into();
        self
    }

    /// Leading dots are stripped, so `".pdf"` and `"pdf"` are equivalent.
    pub fn input_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.config.input_extension = normalise_extension(ext.as_ref());
        self
    }

    pub fn output_extension(mut self, ext: impl AsRef<str>) -> Self {
        self.config.output_extension = normalise_extension(ext.as_ref());
        self
    }

    pub fn sanitize(mut self, v: bool) -> Self {
        self.config.sanitize = v;
        self
    }

    pub fn enable_plugins(mut self, v: bool) -> Self {
        self.config.enable_plugins = v;
        self
    }

    pub fn plugin(mut self, converter: PluginConverter) -> Self {
        self.config.plugins.push(converter);
        self
    }

    pub fn sort_inputs(mut self, v: bool) -> Self {
        self.config.sort_inputs = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, BatchError> {
        let c = &self.config;
        if c.input_extension.is_empty() {
            return Err(BatchError::InvalidConfig(
                "Input extension must not be empty".into(),
            ));
        }
        if c.output_extension.is_empty() {
            return Err(BatchError::InvalidConfig(
                "Output extension must not be empty".into(),
            ));
        }
        if c.source_dir.as_os_str().is_empty() || c.dest_dir.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig(
                "Source and destination directories must be set".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration for building a JSONL dataset from converted Markdown.
///
/// Invoice extraction is off unless [`DatasetConfig::extract`] is set; the
/// LLM fields below are ignored otherwise.
#[derive(Clone)]
pub struct DatasetConfig {
    /// Directory listed for `*.md` files.
    pub input_dir: PathBuf,

    /// JSONL file to write. Overwritten atomically.
    pub output_path: PathBuf,

    /// Process at most this many files (after sorting). Default: no limit.
    pub limit: Option<usize>,

    /// Ask an LLM to extract invoice fields for every record. Default: false.
    pub extract: bool,

    /// LLM model identifier. If None, uses `gpt-4.1-nano`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0; extraction should be deterministic.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per record. Default: 512.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled after each attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::INVOICE_EXTRACTION_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_DEST_DIR),
            output_path: PathBuf::from(DEFAULT_DATASET_PATH),
            limit: None,
            extract: false,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 512,
            max_retries: 3,
            retry_backoff_ms: 500,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for DatasetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetConfig")
            .field("input_dir", &self.input_dir)
            .field("output_path", &self.output_path)
            .field("limit", &self.limit)
            .field("extract", &self.extract)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl DatasetConfig {
    /// Create a new builder for `DatasetConfig`.
    pub fn builder() -> DatasetConfigBuilder {
        DatasetConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`DatasetConfig`].
#[derive(Debug)]
pub struct DatasetConfigBuilder {
    config: DatasetConfig,
}

impl DatasetConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.config.limit = Some(n);
        self
    }

    pub fn extract(mut self, v: bool) -> Self {
        self.config.extract = v;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DatasetConfig, BatchError> {
        let c = &self.config;
        if c.limit == Some(0) {
            return Err(BatchError::InvalidConfig("Limit must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(BatchError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        if c.output_path.as_os_str().is_empty() {
            return Err(BatchError::InvalidConfig(
                "Dataset output path must be set".into(),
            ));
        }
        Ok(self.config)
    }
}

fn normalise_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_defaults_match_dataset_layout() {
        let c = BatchConfig::default();
        assert_eq!(c.source_dir, PathBuf::from("../dataset/originalData"));
        assert_eq!(c.dest_dir, PathBuf::from("../dataset/mdData"));
        assert_eq!(c.input_extension, "pdf");
        assert_eq!(c.output_extension, "md");
        assert!(!c.sanitize);
        assert!(!c.enable_plugins);
        assert!(c.sort_inputs);
    }

    #[test]
    fn extension_dots_are_stripped() {
        let c = BatchConfig::builder()
            .input_extension(".PDF")
            .output_extension(".txt")
            .build()
            .unwrap();
        assert_eq!(c.input_extension, "PDF");
        assert_eq!(c.output_extension, "txt");
    }

    #[test]
    fn empty_extension_rejected() {
        let err = BatchConfig::builder().output_extension(".").build().unwrap_err();
        assert!(matches!(err, BatchError::InvalidConfig(_)));
    }

    #[test]
    fn dataset_zero_limit_rejected() {
        let err = DatasetConfig::builder().limit(0).build().unwrap_err();
        assert!(err.to_string().contains("Limit"));
    }

    #[test]
    fn dataset_temperature_clamped() {
        let c = DatasetConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn debug_hides_callback() {
        let c = BatchConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn BatchProgressCallback>"));
    }
}
