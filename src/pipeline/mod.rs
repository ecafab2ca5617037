//! Per-file pipeline stages.
//!
//! ## Data Flow
//!
//! ```text
//! conversion:  input ──▶ pdf ──▶ postprocess ──▶ [sanitize] ──▶ write
//!              (list)   (pdfium)  (cleanup)      (optional)    (atomic)
//!
//! dataset:     input ──▶ read ──▶ sanitize ──▶ [llm] ──▶ write
//!              (*.md)             (one line)   (invoice)  (jsonl)
//! ```
//!
//! 1. [`input`]  — prepare the destination and list source files
//! 2. [`pdf`]    — extract page text with pdfium
//! 3. [`postprocess`] — deterministic cleanup of extracted text
//! 4. [`sanitize`] — allowlist filter for line-delimited formats
//! 5. [`llm`]    — invoice-field extraction with retry/backoff; the only stage
//!    with network I/O
//! 6. [`write`]  — temp-file-and-rename output
//!
//! [`text`] is a plugin converter for plain-text inputs, used instead of
//! [`pdf`] when plugins are enabled.

pub mod input;
pub mod llm;
pub mod pdf;
pub mod postprocess;
pub mod sanitize;
pub mod text;
pub mod write;
