//! Plain-text plugin: pass `.txt` / `.md` / `.markdown` files through the
//! same cleanup as extracted PDF text.
//!
//! Registered as a plugin rather than a built-in, so it only runs when
//! plugins are enabled.

use crate::engine::DocumentConverter;
use crate::error::EngineError;
use crate::pipeline::postprocess;
use std::path::Path;

const NAME: &str = "plain-text";
const EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// Converter for UTF-8 text files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextConverter;

impl DocumentConverter for PlainTextConverter {
    fn name(&self) -> &str {
        NAME
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
    }

    fn convert(&self, path: &Path) -> Result<String, EngineError> {
        let bytes = std::fs::read(path).map_err(|e| plugin_error(path, e))?;
        let text = String::from_utf8(bytes).map_err(|e| plugin_error(path, e))?;
        Ok(postprocess::clean_text(&text))
    }
}

fn plugin_error(path: &Path, e: impl std::fmt::Display) -> EngineError {
    EngineError::Plugin {
        name: NAME.to_string(),
        detail: format!("{}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn accepts_text_extensions_only() {
        let c = PlainTextConverter;
        assert!(c.accepts(Path::new("notes.txt")));
        assert!(c.accepts(Path::new("README.MD")));
        assert!(c.accepts(Path::new("a.markdown")));
        assert!(!c.accepts(Path::new("a.pdf")));
        assert!(!c.accepts(Path::new("txt")));
    }

    #[test]
    fn text_is_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "line one  \r\nline two\u{200B}\n\n\n\n\n").unwrap();

        let out = PlainTextConverter.convert(&path).unwrap();
        assert_eq!(out, "line one\nline two\n");
    }

    #[test]
    fn invalid_utf8_is_a_plugin_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        fs::write(&path, [0x66u8, 0x6F, 0xFF, 0xFE]).unwrap();

        match PlainTextConverter.convert(&path) {
            Err(EngineError::Plugin { name, detail }) => {
                assert_eq!(name, "plain-text");
                assert!(detail.contains("bad.txt"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_plugin_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlainTextConverter
            .convert(&dir.path().join("absent.txt"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Plugin { .. }));
    }
}
