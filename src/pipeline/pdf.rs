//! PDF text extraction via pdfium.
//!
//! The `pdfium-render` crate wraps the pdfium C++ library. One [`Pdfium`]
//! binding is created per run and reused for every document; loading the
//! shared library is far more expensive than opening a file.
//!
//! Library resolution: `PDFIUM_LIB_PATH` (path to the shared library itself)
//! when set, otherwise the platform's system library search path.

use crate::engine::DocumentConverter;
use crate::error::{BatchError, EngineError};
use crate::pipeline::postprocess;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Built-in converter for `*.pdf` files.
pub struct PdfiumConverter {
    pdfium: Pdfium,
}

impl PdfiumConverter {
    /// Bind pdfium once for the lifetime of the converter.
    pub fn bind() -> Result<Self, BatchError> {
        let bindings = match std::env::var("PDFIUM_LIB_PATH") {
            Ok(path) if !path.is_empty() => {
                let path = PathBuf::from(path);
                info!("Binding pdfium from PDFIUM_LIB_PATH={}", path.display());
                Pdfium::bind_to_library(&path)
            }
            _ => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| BatchError::EngineUnavailable(format!("{e:?}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    fn extract(&self, path: &Path) -> Result<String, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| classify_load_error(path, e))?;

        let pages = document.pages();
        debug!("{}: {} pages", path.display(), pages.len());

        let mut parts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| EngineError::TextExtraction {
                path: path.to_path_buf(),
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;
            parts.push(text.all());
        }

        Ok(postprocess::clean_text(&parts.join("\n\n")))
    }
}

impl DocumentConverter for PdfiumConverter {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    }

    fn convert(&self, path: &Path) -> Result<String, EngineError> {
        self.extract(path)
    }
}

/// Map a pdfium load failure onto the engine taxonomy.
fn classify_load_error(path: &Path, e: PdfiumError) -> EngineError {
    let detail = format!("{e:?}");
    if detail.contains("Password") || detail.contains("password") {
        EngineError::PasswordRequired {
            path: path.to_path_buf(),
        }
    } else {
        EngineError::Corrupt {
            path: path.to_path_buf(),
            detail,
        }
    }
}
