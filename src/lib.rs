//! # edgequake-pdf2speech
//!
//! Turn a PDF into spoken audio, one page at a time.
//!
//! Text is pulled from each page with pdfium and sent to the Google Cloud
//! Text-to-Speech REST API. Every page gets its own audio, so a long
//! document can be listened to (and regenerated) page by page, and one bad
//! page does not sink the rest.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Select   type must be application/pdf, size ≤ 10 MiB
//!  ├─ 2. Extract  plain text per page via pdfium (spawn_blocking)
//!  ├─ 3. Speak    one TTS request per page, text cut to 4800 chars
//!  ├─ 4. Cache    page → audio handle, old audio released on replace
//!  └─ 5. Listen   play / seek / skip / volume, export to <title>.mp3
//! ```
//!
//! [`PipelineController`] owns the workflow state (`Upload → Review →
//! Listen`). [`convert`] and [`convert_to_dir`] run it end to end for a
//! file on disk.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2speech::{convert_to_dir, SpeechConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GOOGLE_TTS_API_KEY
//!     let config = SpeechConfig::builder().language_code("en-US").build()?;
//!     let summary = convert_to_dir("document.pdf", "audio/", &config).await?;
//!     for file in &summary.files {
//!         println!("{}", file.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2speech` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2speech = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod config;
pub mod controller;
pub mod convert;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{AudioHandle, AudioLocator, PageAudioCache, ReleaseHook};
pub use config::{
    AudioEncoding, AudioOverride, AudioParams, PageSelection, SpeechConfig, SpeechConfigBuilder,
    SsmlGender, SynthesisOptions, VoiceOverride, VoiceParams,
};
pub use controller::{BatchReport, PipelineController, PipelineSnapshot, Step};
pub use convert::{
    convert, convert_sync, convert_to_dir, inspect, ConversionOutput, ConversionStats,
    DocumentInfo, ExportSummary, PageSummary,
};
pub use document::Document;
pub use error::{ExtractionError, PageError, Pdf2SpeechError, SynthesisError};
pub use pipeline::extract::{PageExtractor, PageRecord, PdfiumExtractor};
pub use pipeline::synthesize::{AudioClip, GoogleTtsSynthesizer, SpeechSynthesizer};
pub use playback::{export_audio, sanitize_title, AudioSink, PlaybackProgress, PlaybackUnit, TimedSink};
pub use progress::{NoopObserver, Notice, NoticeLevel, PipelineObserver, SharedObserver};
