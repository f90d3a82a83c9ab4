//! Configuration types for PDF-to-speech conversion.
//!
//! All pipeline behaviour is controlled through [`SpeechConfig`], built via
//! its [`SpeechConfigBuilder`]. Voice and audio parameters are grouped the
//! way the Google Cloud Text-to-Speech API groups them (`voice` and
//! `audioConfig`), and per-call overrides merge onto those groups field by
//! field: a caller who only changes the speaking rate keeps the default
//! language, gender, encoding and pitch.

use crate::error::Pdf2SpeechError;
use crate::pipeline::extract::PageExtractor;
use crate::pipeline::synthesize::SpeechSynthesizer;
use crate::progress::PipelineObserver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Google Cloud Text-to-Speech REST endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Environment variable consulted when no API key is configured explicitly.
pub const API_KEY_ENV: &str = "GOOGLE_TTS_API_KEY";

/// Largest text (in characters) submitted in one synthesis request.
///
/// The service rejects requests above roughly 5000 bytes of input; longer
/// text is cut to this length before submission.
pub const DEFAULT_MAX_TEXT_CHARS: usize = 4800;

/// Largest accepted PDF: 10 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// MIME type a selected file must carry.
pub const PDF_MIME: &str = "application/pdf";

/// Configuration for a PDF-to-speech session.
///
/// Built via [`SpeechConfig::builder()`] or using [`SpeechConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2speech::{SpeechConfig, SsmlGender};
///
/// let config = SpeechConfig::builder()
///     .language_code("en-US")
///     .ssml_gender(SsmlGender::Female)
///     .speaking_rate(1.25)
///     .build()
///     .unwrap();
/// assert_eq!(config.voice.language_code, "en-US");
/// ```
#[derive(Clone)]
pub struct SpeechConfig {
    /// Default voice selection. Default: `pt-BR`, neutral gender, no explicit name.
    pub voice: VoiceParams,

    /// Default audio output parameters. Default: MP3, rate 1.0, pitch 0.
    pub audio: AudioParams,

    /// Maximum characters submitted per synthesis call. Default: 4800.
    pub max_text_chars: usize,

    /// Maximum accepted PDF size in bytes. Default: 10 MiB.
    pub max_file_bytes: u64,

    /// Synthesis endpoint URL. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// API key sent as the `key` query parameter.
    /// If None, [`API_KEY_ENV`] is consulted when the synthesizer is built.
    pub api_key: Option<String>,

    /// Per-request deadline in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Pages synthesized by the one-shot entry points. Default: all.
    pub pages: PageSelection,

    /// Synthesize all text as one request instead of page by page.
    pub whole_document: bool,

    /// Explicit path to a pdfium shared library. If None, `PDFIUM_LIB_PATH`
    /// and then the system library search path are tried.
    pub pdfium_library_path: Option<PathBuf>,

    /// Pre-constructed synthesizer. Takes precedence over endpoint/api_key.
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,

    /// Pre-constructed extractor. Takes precedence over the pdfium backend.
    pub extractor: Option<Arc<dyn PageExtractor>>,

    /// Receives notices and per-page batch events.
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice: VoiceParams::default(),
            audio: AudioParams::default(),
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_timeout_secs: 60,
            pages: PageSelection::All,
            whole_document: false,
            pdfium_library_path: None,
            synthesizer: None,
            extractor: None,
            observer: None,
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("voice", &self.voice)
            .field("audio", &self.audio)
            .field("max_text_chars", &self.max_text_chars)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pages", &self.pages)
            .field("whole_document", &self.whole_document)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .field("synthesizer", &self.synthesizer.as_ref().map(|_| "<dyn SpeechSynthesizer>"))
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn PageExtractor>"))
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl SpeechConfig {
    /// Create a new builder for `SpeechConfig`.
    pub fn builder() -> SpeechConfigBuilder {
        SpeechConfigBuilder {
            config: Self::default(),
        }
    }

    /// The API key from config, falling back to [`API_KEY_ENV`].
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

/// Builder for [`SpeechConfig`].
#[derive(Debug)]
pub struct SpeechConfigBuilder {
    config: SpeechConfig,
}

impl SpeechConfigBuilder {
    pub fn language_code(mut self, code: impl Into<String>) -> Self {
        self.config.voice.language_code = code.into();
        self
    }

    pub fn voice_name(mut self, name: impl Into<String>) -> Self {
        self.config.voice.name = Some(name.into());
        self
    }

    pub fn ssml_gender(mut self, gender: SsmlGender) -> Self {
        self.config.voice.ssml_gender = gender;
        self
    }

    pub fn audio_encoding(mut self, encoding: AudioEncoding) -> Self {
        self.config.audio.audio_encoding = encoding;
        self
    }

    pub fn speaking_rate(mut self, rate: f64) -> Self {
        self.config.audio.speaking_rate = Some(rate.clamp(0.25, 4.0));
        self
    }

    pub fn pitch(mut self, pitch: f64) -> Self {
        self.config.audio.pitch = Some(pitch.clamp(-20.0, 20.0));
        self
    }

    pub fn volume_gain_db(mut self, db: f64) -> Self {
        self.config.audio.volume_gain_db = Some(db.clamp(-96.0, 16.0));
        self
    }

    pub fn sample_rate_hertz(mut self, hz: u32) -> Self {
        self.config.audio.sample_rate_hertz = Some(hz);
        self
    }

    pub fn max_text_chars(mut self, n: usize) -> Self {
        self.config.max_text_chars = n;
        self
    }

    pub fn max_file_bytes(mut self, n: u64) -> Self {
        self.config.max_file_bytes = n;
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pages(mut self, pages: PageSelection) -> Self {
        self.config.pages = pages;
        self
    }

    pub fn whole_document(mut self, v: bool) -> Self {
        self.config.whole_document = v;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.config.synthesizer = Some(synthesizer);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SpeechConfig, Pdf2SpeechError> {
        let c = &self.config;
        if c.max_text_chars == 0 {
            return Err(Pdf2SpeechError::InvalidConfig(
                "max_text_chars must be ≥ 1".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(Pdf2SpeechError::InvalidConfig(
                "max_file_bytes must be ≥ 1".into(),
            ));
        }
        if c.voice.language_code.trim().is_empty() {
            return Err(Pdf2SpeechError::InvalidConfig(
                "language code must not be empty".into(),
            ));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(Pdf2SpeechError::InvalidConfig(format!(
                "endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.endpoint
            )));
        }
        Ok(self.config)
    }
}

// ── Voice / audio parameter groups ───────────────────────────────────────

/// SSML voice gender requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SsmlGender {
    #[default]
    Neutral,
    Male,
    Female,
    SsmlVoiceGenderUnspecified,
}

/// Encoding of the returned audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    /// 16-bit PCM in a WAV container.
    Linear16,
    #[default]
    Mp3,
    OggOpus,
}

impl AudioEncoding {
    /// File extension used when exporting audio of this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "wav",
            AudioEncoding::Mp3 => "mp3",
            AudioEncoding::OggOpus => "ogg",
        }
    }

    /// Media type of audio of this encoding.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "audio/wav",
            AudioEncoding::Mp3 => "audio/mpeg",
            AudioEncoding::OggOpus => "audio/ogg",
        }
    }
}

/// The `voice` group of a synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParams {
    pub language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ssml_gender: SsmlGender,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            language_code: "pt-BR".to_string(),
            name: None,
            ssml_gender: SsmlGender::Neutral,
        }
    }
}

/// The `audioConfig` group of a synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioParams {
    pub audio_encoding: AudioEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaking_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_gain_db: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate_hertz: Option<u32>,
}

impl Default for AudioParams {
    fn default() -> Self {
        Self {
            audio_encoding: AudioEncoding::Mp3,
            speaking_rate: Some(1.0),
            pitch: Some(0.0),
            volume_gain_db: None,
            sample_rate_hertz: None,
        }
    }
}

/// Per-call voice override. Unset fields inherit the configured default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceOverride {
    pub language_code: Option<String>,
    pub name: Option<String>,
    pub ssml_gender: Option<SsmlGender>,
}

/// Per-call audio override. Unset fields inherit the configured default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioOverride {
    pub audio_encoding: Option<AudioEncoding>,
    pub speaking_rate: Option<f64>,
    pub pitch: Option<f64>,
    pub volume_gain_db: Option<f64>,
    pub sample_rate_hertz: Option<u32>,
}

/// Overrides applied to a single synthesis call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    pub voice: VoiceOverride,
    pub audio: AudioOverride,
}

impl VoiceParams {
    /// Overlay `o` onto these params. Fields left `None` in `o` are kept.
    pub fn merged(&self, o: &VoiceOverride) -> VoiceParams {
        VoiceParams {
            language_code: o
                .language_code
                .clone()
                .unwrap_or_else(|| self.language_code.clone()),
            name: o.name.clone().or_else(|| self.name.clone()),
            ssml_gender: o.ssml_gender.unwrap_or(self.ssml_gender),
        }
    }
}

impl AudioParams {
    /// Overlay `o` onto these params. Fields left `None` in `o` are kept.
    pub fn merged(&self, o: &AudioOverride) -> AudioParams {
        AudioParams {
            audio_encoding: o.audio_encoding.unwrap_or(self.audio_encoding),
            speaking_rate: o.speaking_rate.or(self.speaking_rate),
            pitch: o.pitch.or(self.pitch),
            volume_gain_db: o.volume_gain_db.or(self.volume_gain_db),
            sample_rate_hertz: o.sample_rate_hertz.or(self.sample_rate_hertz),
        }
    }
}

// ── Page selection ───────────────────────────────────────────────────────

/// Specifies which pages of the PDF to synthesize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 1-indexed
    /// page numbers that exist in a `total_pages` document.
    pub fn to_page_numbers(&self, total_pages: usize) -> Vec<usize> {
        let mut pages: Vec<usize> = match self {
            PageSelection::All => (1..=total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![*p]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1);
                let e = (*end).min(total_pages);
                (s..=e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .copied()
                .filter(|&p| p >= 1 && p <= total_pages)
                .collect(),
        };
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}
