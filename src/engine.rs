//! Conversion engines: the seam between the batch loop and text extraction.
//!
//! The batch loop only sees [`ConversionEngine`]. The default implementation,
//! [`MarkdownEngine`], dispatches each file to the first registered
//! [`DocumentConverter`] that accepts it. Converters come in two tiers:
//!
//! * **built-ins** — always consulted (pdfium for `*.pdf`)
//! * **plugins** — consulted first, but only when `enable_plugins` is set
//!
//! An engine is built once per run and borrowed by every per-file call.
//! [`MarkdownEngineBuilder::configure`] takes plugins and the toggle from a
//! [`BatchConfig`], which is how [`crate::batch::convert_directory`] builds
//! its engine.

use crate::config::BatchConfig;
use crate::error::EngineError;
use crate::output::ConversionResult;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Anything that can turn a document path into text.
pub trait ConversionEngine {
    fn convert(&self, path: &Path) -> Result<ConversionResult, EngineError>;
}

/// One format handler registered on a [`MarkdownEngine`].
pub trait DocumentConverter {
    /// Short name used in logs and plugin errors.
    fn name(&self) -> &str;

    /// Whether this converter handles `path`. Usually an extension check.
    fn accepts(&self, path: &Path) -> bool;

    /// Extract Markdown-formatted text from `path`.
    fn convert(&self, path: &Path) -> Result<String, EngineError>;
}

/// A plugin converter. Shared so a [`BatchConfig`] can carry it.
pub type PluginConverter = Arc<dyn DocumentConverter + Send + Sync>;

/// Converter registry with an explicit plugin toggle.
pub struct MarkdownEngine {
    builtins: Vec<Box<dyn DocumentConverter>>,
    plugins: Vec<PluginConverter>,
    enable_plugins: bool,
}

impl MarkdownEngine {
    /// An engine with no converters registered.
    pub fn builder() -> MarkdownEngineBuilder {
        MarkdownEngineBuilder {
            engine: MarkdownEngine {
                builtins: Vec::new(),
                plugins: Vec::new(),
                enable_plugins: false,
            },
        }
    }

    pub fn plugins_enabled(&self) -> bool {
        self.enable_plugins
    }

    fn select(&self, path: &Path) -> Option<&dyn DocumentConverter> {
        let plugins = self
            .plugins
            .iter()
            .filter(|_| self.enable_plugins)
            .map(|c| c.as_ref() as &dyn DocumentConverter);
        plugins
            .chain(self.builtins.iter().map(|c| &**c))
            .find(|c| c.accepts(path))
    }
}

impl ConversionEngine for MarkdownEngine {
    fn convert(&self, path: &Path) -> Result<ConversionResult, EngineError> {
        let converter = self.select(path).ok_or_else(|| EngineError::Unsupported {
            path: path.to_path_buf(),
        })?;
        debug!("{} → converter '{}'", path.display(), converter.name());
        converter.convert(path).map(ConversionResult::new)
    }
}

/// Builder for [`MarkdownEngine`].
pub struct MarkdownEngineBuilder {
    engine: MarkdownEngine,
}

impl MarkdownEngineBuilder {
    pub fn builtin(mut self, converter: Box<dyn DocumentConverter>) -> Self {
        self.engine.builtins.push(converter);
        self
    }

    pub fn plugin(mut self, converter: PluginConverter) -> Self {
        self.engine.plugins.push(converter);
        self
    }

    /// Register `config`'s plugins and adopt its `enable_plugins` flag.
    pub fn configure(mut self, config: &BatchConfig) -> Self {
        self.engine.plugins.extend(config.plugins.iter().cloned());
        self.engine.enable_plugins = config.enable_plugins;
        self
    }

    pub fn enable_plugins(mut self, v: bool) -> Self {
        self.engine.enable_plugins = v;
        self
    }

    pub fn build(self) -> MarkdownEngine {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        name: &'static str,
        ext: &'static str,
    }

    impl DocumentConverter for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn accepts(&self, path: &Path) -> bool {
            path.extension().is_some_and(|e| e == self.ext)
        }

        fn convert(&self, _path: &Path) -> Result<String, EngineError> {
            Ok(format!("from {}", self.name))
        }
    }

    fn engine(enable_plugins: bool) -> MarkdownEngine {
        MarkdownEngine::builder()
            .builtin(Box::new(Fixed { name: "core", ext: "pdf" }))
            .plugin(Arc::new(Fixed { name: "ocr", ext: "pdf" }))
            .plugin(Arc::new(Fixed { name: "docx", ext: "docx" }))
            .enable_plugins(enable_plugins)
            .build()
    }

    #[test]
    fn plugins_ignored_when_disabled() {
        let e = engine(false);
        let out = e.convert(Path::new("a.pdf")).unwrap();
        assert_eq!(out.text_content, "from core");
        assert!(matches!(
            e.convert(Path::new("a.docx")),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn plugins_take_priority_when_enabled() {
        let e = engine(true);
        assert!(e.plugins_enabled());
        assert_eq!(e.convert(Path::new("a.pdf")).unwrap().text_content, "from ocr");
        assert_eq!(e.convert(Path::new("a.docx")).unwrap().text_content, "from docx");
    }

    #[test]
    fn empty_engine_rejects_everything() {
        let e = MarkdownEngine::builder().build();
        assert!(matches!(
            e.convert(Path::new("a.pdf")),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn configure_takes_plugins_and_toggle_from_config() {
        let config = BatchConfig::builder()
            .plugin(Arc::new(Fixed { name: "ocr", ext: "pdf" }))
            .enable_plugins(true)
            .build()
            .unwrap();
        let e = MarkdownEngine::builder()
            .builtin(Box::new(Fixed { name: "core", ext: "pdf" }))
            .configure(&config)
            .build();
        assert!(e.plugins_enabled());
        assert_eq!(e.convert(Path::new("a.pdf")).unwrap().text_content, "from ocr");
    }
}
