//! Page text extraction via pdfium.
//!
//! ## Threading
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool so the
//! runtime's worker threads never stall on a large document.
//!
//! ## Fragment joining
//!
//! Text is taken segment by segment in the order pdfium reports it and
//! joined with single spaces. No layout reconstruction is attempted: the
//! goal is something a speech engine can read aloud, not a faithful
//! reproduction of the page.

use crate::error::ExtractionError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Plain text, possibly empty.
    pub text: String,
}

impl PageRecord {
    /// Whether there is anything worth sending to the speech service.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Character count of the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Produces per-page text from raw PDF bytes.
///
/// Implementations must return exactly one record per page, numbered
/// `1..=N` in ascending order. A page without text yields an empty string;
/// a document with zero pages yields an empty vector. Only a document that
/// cannot be opened at all is an error.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(&self, pdf: Arc<[u8]>) -> Result<Vec<PageRecord>, ExtractionError>;
}

/// Number page texts `1..=N` in the order given.
pub fn number_pages<I>(texts: I) -> Vec<PageRecord>
where
    I: IntoIterator<Item = String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageRecord {
            page_num: i + 1,
            text,
        })
        .collect()
}

/// Join text fragments with single spaces, in the order given.
pub fn join_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, f) in fragments.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(f.as_ref());
    }
    out
}

/// [`PageExtractor`] backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    /// Bind to `PDFIUM_LIB_PATH` if set, else the system library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to an explicit library file.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, ExtractionError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                debug!("Binding pdfium from {}", path.display());
                Pdfium::bind_to_library(&path)
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractionError::Backend(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

#[async_trait]
impl PageExtractor for PdfiumExtractor {
    async fn extract(&self, pdf: Arc<[u8]>) -> Result<Vec<PageRecord>, ExtractionError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.extract_blocking(&pdf))
            .await
            .map_err(|e| ExtractionError::Unreadable(format!("extraction task panicked: {}", e)))?
    }
}

impl PdfiumExtractor {
    /// Blocking implementation of page extraction.
    fn extract_blocking(&self, pdf: &[u8]) -> Result<Vec<PageRecord>, ExtractionError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ExtractionError::Unreadable(format!("{:?}", e)))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let mut texts = Vec::with_capacity(total_pages);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ExtractionError::Unreadable(format!("page {}: {:?}", idx + 1, e)))?;
            let joined = join_fragments(text.segments().iter().map(|s| s.text()));
            debug!("Page {}: {} chars", idx + 1, joined.chars().count());
            texts.push(joined);
        }

        Ok(number_pages(texts))
    }
}
