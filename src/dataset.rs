//! JSONL dataset building from converted Markdown.
//!
//! Every `*.md` file in the input directory becomes one JSON object on one
//! line: file name, stem, sanitized text and, when extraction is enabled,
//! the invoice fields an LLM found in the raw Markdown. Files are handled one
//! at a time; a file that cannot be read is skipped and reported, and an
//! extraction failure is stored on its record instead of dropping it.

use crate::config::DatasetConfig;
use crate::error::{BatchError, FileError};
use crate::output::{DatasetRecord, DatasetSummary, InvoiceFields, SkippedFile};
use crate::pipeline::input::{self, SourceFile};
use crate::pipeline::{llm, sanitize, write};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Produces invoice fields for one Markdown document.
pub trait InvoiceExtractor {
    fn extract(
        &self,
        file: &str,
        markdown: &str,
    ) -> impl Future<Output = Result<InvoiceFields, FileError>>;
}

/// [`InvoiceExtractor`] backed by an `edgequake-llm` provider.
pub struct LlmExtractor {
    provider: Arc<dyn LLMProvider>,
    config: DatasetConfig,
}

impl LlmExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>, config: DatasetConfig) -> Self {
        Self { provider, config }
    }

    /// Resolve the provider from `config` and the environment.
    pub fn from_config(config: &DatasetConfig) -> Result<Self, BatchError> {
        Ok(Self::new(resolve_provider(config)?, config.clone()))
    }
}

impl InvoiceExtractor for LlmExtractor {
    async fn extract(&self, file: &str, markdown: &str) -> Result<InvoiceFields, FileError> {
        llm::extract_invoice(&self.provider, file, markdown, &self.config).await
    }
}

/// Build the dataset described by `config`.
///
/// When `config.extract` is set the LLM provider is resolved once up front;
/// a missing provider is fatal.
pub async fn build_dataset(config: &DatasetConfig) -> Result<DatasetSummary, BatchError> {
    if config.extract {
        let extractor = LlmExtractor::from_config(config)?;
        run_dataset(config, Some(&extractor)).await
    } else {
        run_dataset::<LlmExtractor>(config, None).await
    }
}

/// Build the dataset with a caller-supplied extractor (or none).
pub async fn run_dataset<E: InvoiceExtractor>(
    config: &DatasetConfig,
    extractor: Option<&E>,
) -> Result<DatasetSummary, BatchError> {
    let start = Instant::now();

    let mut files = input::list_inputs(&config.input_dir, "md", true)?;
    if let Some(limit) = config.limit {
        files.truncate(limit);
    }
    info!(
        "Processing {} files from {}",
        files.len(),
        config.input_dir.display()
    );

    let mut lines = String::new();
    let mut records = 0usize;
    let mut extracted = 0usize;
    let mut skipped = Vec::new();

    for (index, source) in files.iter().enumerate() {
        info!("=== Processing file {}: {} ===", index + 1, source.stem());

        let record = match build_record(source, extractor).await {
            Ok(record) => record,
            Err(error) => {
                warn!("Error processing file {}: {}", source.file_name(), error);
                skipped.push(SkippedFile {
                    source: source.path().to_path_buf(),
                    error,
                });
                continue;
            }
        };

        if record.invoice.is_some() {
            extracted += 1;
        }
        let line = serde_json::to_string(&record)
            .map_err(|e| BatchError::Internal(format!("record serialisation: {e}")))?;
        lines.push_str(&line);
        lines.push('\n');
        records += 1;
    }

    let output = config.output_path.clone();
    let write_err = |e: std::io::Error| BatchError::DatasetWriteFailed {
        path: output.clone(),
        source: e,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    write::write_atomic(&output, lines.as_bytes()).map_err(write_err)?;

    info!(
        "Wrote {} records ({} extracted, {} skipped) to {}",
        records,
        extracted,
        skipped.len(),
        output.display()
    );

    Ok(DatasetSummary {
        output,
        records,
        extracted,
        skipped,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

async fn build_record<E: InvoiceExtractor>(
    source: &SourceFile,
    extractor: Option<&E>,
) -> Result<DatasetRecord, FileError> {
    let content =
        std::fs::read_to_string(source.path()).map_err(|e| FileError::ReadFailed {
            path: source.path().to_path_buf(),
            detail: e.to_string(),
        })?;

    let (invoice, extraction_error) = match extractor {
        Some(ex) => match ex.extract(&source.file_name(), &content).await {
            Ok(fields) => {
                info!("Extracted data: {}", serde_json::to_string(&fields).unwrap_or_default());
                (Some(fields), None)
            }
            Err(e) => {
                warn!("{}", e);
                (None, Some(e.to_string()))
            }
        },
        None => (None, None),
    };

    Ok(DatasetRecord {
        source: source.file_name(),
        title: source.stem(),
        text: sanitize::sanitize(&content),
        invoice,
        extraction_error,
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider + model** (`config.provider_name`) — the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &DatasetConfig) -> Result<Arc<dyn LLMProvider>, BatchError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| BatchError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, BatchError> {
    ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        BatchError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    struct FakeExtractor;

    impl InvoiceExtractor for FakeExtractor {
        async fn extract(&self, file: &str, markdown: &str) -> Result<InvoiceFields, FileError> {
            if markdown.contains("no invoice") {
                return Err(FileError::ExtractionFailed {
                    file: file.to_string(),
                    retries: 0,
                    detail: "reply is not invoice JSON".into(),
                });
            }
            Ok(InvoiceFields {
                total_amount: Some(12.5),
                currency: Some("USD".into()),
                ..Default::default()
            })
        }
    }

    fn config(input: &Path, output: &Path) -> DatasetConfig {
        DatasetConfig::builder()
            .input_dir(input)
            .output_path(output)
            .build()
            .unwrap()
    }

    fn read_records(path: &Path) -> Vec<DatasetRecord> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn one_sanitized_record_per_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.md"), "# Total\n\n42 €\n").unwrap();
        fs::write(dir.path().join("a.md"), "Hello\tWorld\n\n日本語  test").unwrap();
        fs::write(dir.path().join("skip.pdf"), "%PDF").unwrap();
        let out = dir.path().join("out/dataset.jsonl");

        let summary = run_dataset::<FakeExtractor>(&config(dir.path(), &out), None)
            .await
            .unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.extracted, 0);

        let records = read_records(&out);
        assert_eq!(records[0].source, "a.md");
        assert_eq!(records[0].title, "a");
        assert_eq!(records[0].text, "Hello World 日本語 test");
        assert_eq!(records[1].text, "# Total 42 €");
        assert!(records.iter().all(|r| r.invoice.is_none()));
    }

    #[tokio::test]
    async fn extraction_failure_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "Invoice total 12.50 USD").unwrap();
        fs::write(dir.path().join("b.md"), "no invoice here").unwrap();
        let out = dir.path().join("dataset.jsonl");

        let summary = run_dataset(&config(dir.path(), &out), Some(&FakeExtractor))
            .await
            .unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.extracted, 1);

        let records = read_records(&out);
        assert_eq!(records[0].invoice.as_ref().unwrap().total_amount, Some(12.5));
        assert!(records[1].invoice.is_none());
        assert!(records[1]
            .extraction_error
            .as_deref()
            .unwrap()
            .contains("not invoice JSON"));
    }

    #[test]
    fn limit_is_honoured() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..7 {
            fs::write(dir.path().join(format!("{i}.md")), format!("doc {i}")).unwrap();
        }
        let out = dir.path().join("dataset.jsonl");
        let mut cfg = config(dir.path(), &out);
        cfg.limit = Some(5);

        let summary =
            tokio_test::block_on(run_dataset::<FakeExtractor>(&cfg, None)).unwrap();
        assert_eq!(summary.records, 5);
        assert_eq!(read_records(&out).last().unwrap().title, "4");
    }

    #[tokio::test]
    async fn unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "fine").unwrap();
        fs::write(dir.path().join("b.md"), [0xFFu8, 0xFE, 0x00]).unwrap();
        let out = dir.path().join("dataset.jsonl");

        let summary = run_dataset::<FakeExtractor>(&config(dir.path(), &out), None)
            .await
            .unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.skipped.len(), 1);
        assert!(matches!(summary.skipped[0].error, FileError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn missing_input_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_dataset::<FakeExtractor>(
            &config(&dir.path().join("absent"), &dir.path().join("d.jsonl")),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BatchError::SourceListFailed { .. }));
    }

    #[test]
    fn explicit_provider_name_errors_are_reported() {
        let cfg = DatasetConfig::builder()
            .provider_name("definitely-not-a-provider")
            .build()
            .unwrap();
        match resolve_provider(&cfg) {
            Err(BatchError::ProviderNotConfigured { provider, .. }) => {
                assert_eq!(provider, "definitely-not-a-provider")
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("unknown provider should not resolve"),
        }
    }
}
