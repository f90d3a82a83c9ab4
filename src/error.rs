//! Error types for the edgequake-pdf2speech library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`Pdf2SpeechError`] (**step-blocking**): the requested pipeline action
//!   could not be carried out (bad file, unreadable PDF, missing credential,
//!   every page failed). The controller leaves its state where it was.
//!
//! * [`SynthesisError`]: the outcome of one call to a speech synthesizer.
//!   Network-level failures are a subtype (see [`SynthesisError::is_network`]).
//!
//! * [`PageError`] (**non-fatal**): one page failed during a batch run while
//!   the others carried on. Collected into [`crate::controller::BatchReport`]
//!   so callers see partial success instead of losing the whole document.

use std::path::PathBuf;
use thiserror::Error;

/// All step-blocking errors returned by the edgequake-pdf2speech library.
///
/// Page-level failures inside a batch use [`PageError`] and are reported in
/// aggregate rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2SpeechError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The selected file is not typed as a PDF.
    #[error("'{name}' is not a PDF (type: {mime}). Please select a valid PDF file.")]
    NotAPdf { name: String, mime: String },

    /// The selected file exceeds the configured size limit.
    #[error("'{name}' is too large ({size} bytes). The maximum size is {max} bytes.")]
    FileTooLarge { name: String, size: u64, max: u64 },

    // ── Guard / precondition errors ───────────────────────────────────────
    /// An action needs a document but none is selected.
    #[error("No document selected. Select a PDF file first.")]
    NoDocument,

    /// Extraction has not produced any pages yet.
    #[error("No extracted pages. Extract the text first.")]
    NoPages,

    /// The requested page has no extractable text.
    #[error("There is no text on page {page} to convert.")]
    NoText { page: usize },

    /// None of the requested pages has text.
    #[error("None of the selected pages has text to convert.")]
    EmptySelection,

    /// Page number outside `[1, total]`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Another extraction or synthesis is still in flight.
    #[error("Busy: {activity} is still in progress")]
    Busy { activity: String },

    /// The action is not allowed from the current stage.
    #[error("Cannot {action} while in the {stage} stage")]
    InvalidTransition { stage: &'static str, action: &'static str },

    /// The result belonged to a document that has since been replaced or reset.
    #[error("Result for page {page:?} discarded: the session moved on while it was in flight")]
    Superseded { page: Option<usize> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The PDF could not be opened or parsed at all.
    #[error("Failed to process PDF '{name}': {detail}")]
    ExtractionFailed { name: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Synthesis errors ──────────────────────────────────────────────────
    /// A single synthesis call failed.
    #[error("Failed to convert text to speech{}: {source}", page_suffix(.page))]
    Synthesis {
        page: Option<usize>,
        #[source]
        source: SynthesisError,
    },

    /// Every attempted page failed; nothing was converted.
    #[error("All {total} pages failed to convert.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// No credential is available for the speech service.
    #[error("No text-to-speech credential configured.\nSet GOOGLE_TTS_API_KEY or pass --api-key.")]
    CredentialMissing,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an exported audio file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn page_suffix(page: &Option<usize>) -> String {
    page.map(|p| format!(" (page {p})")).unwrap_or_default()
}

impl Pdf2SpeechError {
    /// Wrap an extractor failure for the document called `name`.
    pub fn extraction(name: &str, e: ExtractionError) -> Self {
        match e {
            ExtractionError::Unreadable(detail) => Pdf2SpeechError::ExtractionFailed {
                name: name.to_string(),
                detail,
            },
            ExtractionError::Backend(detail) => Pdf2SpeechError::PdfiumBindingFailed(detail),
        }
    }

    /// Whether this error should reach the user as a notification.
    ///
    /// Discarded stale results are bookkeeping, not failures.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Pdf2SpeechError::Superseded { .. })
    }
}

/// Failure of one request to a speech synthesizer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SynthesisError {
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never got a response (DNS, connect, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the configured deadline.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The response carried no audio payload.
    #[error("response contained no audio content")]
    MissingAudio,

    /// The response could not be parsed or its audio could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// The request could not be built (bad endpoint, serialisation).
    #[error("invalid request: {0}")]
    Request(String),
}

impl SynthesisError {
    /// `true` for transport-level failures (no HTTP response at all).
    pub fn is_network(&self) -> bool {
        matches!(self, SynthesisError::Network(_) | SynthesisError::Timeout { .. })
    }
}

/// Failure of a page extractor to read a document.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// The bytes could not be opened or parsed as a PDF.
    #[error("{0}")]
    Unreadable(String),

    /// The PDF backend itself is unavailable.
    #[error("{0}")]
    Backend(String),
}

/// A non-fatal error for a single page.
///
/// Collected by batch synthesis; the batch continues unless ALL pages fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The speech service rejected or failed the page.
    #[error("Page {page}: synthesis failed: {detail}")]
    SynthesisFailed { page: usize, detail: String },
}

impl PageError {
    pub fn page(&self) -> usize {
        match self {
            PageError::SynthesisFailed { page, .. } => *page,
        }
    }
}
