//! One-shot conversion entry points.
//!
//! These drive a [`PipelineController`] through the whole workflow for a
//! file on disk: select, extract, synthesize (page by page or as one
//! request), and optionally write the audio to a directory. Interactive
//! hosts use the controller directly instead.

use crate::cache::AudioHandle;
use crate::config::SpeechConfig;
use crate::controller::PipelineController;
use crate::document::Document;
use crate::error::{PageError, Pdf2SpeechError};
use crate::pipeline::extract::{PageExtractor, PageRecord, PdfiumExtractor};
use crate::pipeline::synthesize::{GoogleTtsSynthesizer, SpeechSynthesizer};
use crate::playback::export_audio;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Everything produced by [`convert`].
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Document name without the `.pdf` suffix.
    pub title: String,
    pub pages: Vec<PageRecord>,
    /// Page audio in ascending page order.
    pub audio: Vec<AudioHandle>,
    /// Whole-document audio, when `whole_document` was set.
    pub document_audio: Option<AudioHandle>,
    pub failures: Vec<PageError>,
    pub stats: ConversionStats,
}

/// Counters and timings for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub pages_with_text: usize,
    pub converted_pages: usize,
    pub failed_pages: usize,
    pub skipped_pages: usize,
    pub truncated_pages: usize,
    pub audio_bytes: usize,
    pub total_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub synthesis_duration_ms: u64,
}

/// Result of [`convert_to_dir`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub stats: ConversionStats,
}

/// Per-page overview produced by [`inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size_bytes: u64,
    pub page_count: usize,
    pub pages: Vec<PageSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page_num: usize,
    pub chars: usize,
    pub has_text: bool,
}

/// Convert a PDF file to speech.
///
/// # Errors
/// Returns `Err` only when nothing could be produced: an invalid or
/// unreadable file, a missing credential, or every page failing. Partial
/// failures are listed in [`ConversionOutput::failures`].
pub async fn convert(
    path: impl AsRef<Path>,
    config: &SpeechConfig,
) -> Result<ConversionOutput, Pdf2SpeechError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    info!("Starting conversion: {}", path.display());

    let controller = PipelineController::new(config.clone())?;
    let document = Document::from_path(path, config).await?;
    let title = document.title().to_string();
    controller.select_file(document)?;

    let extract_start = Instant::now();
    let total_pages = controller.extract().await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

    let synth_start = Instant::now();
    let (report, document_audio) = if config.whole_document {
        (None, Some(controller.synthesize_document().await?))
    } else {
        (Some(controller.synthesize_selection(&config.pages).await?), None)
    };
    let synthesis_duration_ms = synth_start.elapsed().as_millis() as u64;

    let pages = controller.pages();
    let audio = controller.page_audio();
    let audio_bytes = audio.iter().chain(document_audio.iter()).map(|h| h.len()).sum();

    let stats = ConversionStats {
        total_pages,
        pages_with_text: pages.iter().filter(|p| p.has_text()).count(),
        converted_pages: report.as_ref().map(|r| r.succeeded).unwrap_or(0),
        failed_pages: report.as_ref().map(|r| r.failed.len()).unwrap_or(0),
        skipped_pages: report.as_ref().map(|r| r.skipped_empty.len()).unwrap_or(0),
        truncated_pages: report.as_ref().map(|r| r.truncated.len()).unwrap_or(0),
        audio_bytes,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extract_duration_ms,
        synthesis_duration_ms,
    };

    info!(
        "Conversion complete: {}/{} pages, {} audio bytes, {}ms total",
        stats.converted_pages, total_pages, stats.audio_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        title,
        pages,
        audio,
        document_audio,
        failures: report.map(|r| r.failed).unwrap_or_default(),
        stats,
    })
}

/// Convert a PDF and write the audio into `out_dir`.
///
/// Page audio is written as `<title>_page_NNN.<ext>`; whole-document audio
/// as `<title>.<ext>`. Each file is written atomically.
pub async fn convert_to_dir(
    path: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &SpeechConfig,
) -> Result<ExportSummary, Pdf2SpeechError> {
    let output = convert(path, config).await?;
    let out_dir = out_dir.as_ref();

    let mut files = Vec::with_capacity(output.audio.len() + 1);
    if let Some(ref doc) = output.document_audio {
        files.push(export_audio(doc, &output.title, out_dir).await?);
    }
    for handle in &output.audio {
        let page = handle.page().unwrap_or(0);
        let title = format!("{} page {:03}", output.title, page);
        files.push(export_audio(handle, &title, out_dir).await?);
    }
    debug!("Exported {} files to {}", files.len(), out_dir.display());

    Ok(ExportSummary {
        files,
        stats: output.stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &SpeechConfig,
) -> Result<ConversionOutput, Pdf2SpeechError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2SpeechError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(path, config))
}

/// Extract page text and report per-page character counts.
///
/// Does not require a speech credential.
pub async fn inspect(
    path: impl AsRef<Path>,
    config: &SpeechConfig,
) -> Result<DocumentInfo, Pdf2SpeechError> {
    let document = Document::from_path(path, config).await?;
    let extractor = resolve_extractor(config);
    let pages = extractor
        .extract(document.shared_bytes())
        .await
        .map_err(|e| Pdf2SpeechError::extraction(document.name(), e))?;

    Ok(DocumentInfo {
        name: document.name().to_string(),
        size_bytes: document.size(),
        page_count: pages.len(),
        pages: pages
            .iter()
            .map(|p| PageSummary {
                page_num: p.page_num,
                chars: p.char_count(),
                has_text: p.has_text(),
            })
            .collect(),
    })
}

// ── Backend resolution ───────────────────────────────────────────────────

/// The configured extractor, or pdfium.
pub fn resolve_extractor(config: &SpeechConfig) -> Arc<dyn PageExtractor> {
    if let Some(ref extractor) = config.extractor {
        return Arc::clone(extractor);
    }
    match config.pdfium_library_path {
        Some(ref path) => Arc::new(PdfiumExtractor::with_library_path(path)),
        None => Arc::new(PdfiumExtractor::new()),
    }
}

/// The configured synthesizer, or Google Cloud TTS.
///
/// 1. **Pre-built synthesizer** (`config.synthesizer`) is used as-is.
/// 2. Otherwise a [`GoogleTtsSynthesizer`] is built from the endpoint and
///    the key in `config.api_key` or `GOOGLE_TTS_API_KEY`.
pub fn resolve_synthesizer(
    config: &SpeechConfig,
) -> Result<Arc<dyn SpeechSynthesizer>, Pdf2SpeechError> {
    if let Some(ref synthesizer) = config.synthesizer {
        return Ok(Arc::clone(synthesizer));
    }
    Ok(Arc::new(GoogleTtsSynthesizer::from_config(config)?))
}
