//! The selected source document and its admission rules.
//!
//! A [`Document`] is what a file picker or drag-and-drop hands over: raw
//! bytes, a display name, a size, and a declared media type. The pipeline
//! accepts it only when the type is exactly `application/pdf` and the size
//! is within the configured limit; both checks run before any async work.

use crate::config::{SpeechConfig, PDF_MIME};
use crate::error::Pdf2SpeechError;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A user-selected file.
///
/// Bytes are reference counted so the extractor can take a cheap clone onto
/// a blocking thread without copying the PDF.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
}

impl Document {
    /// Wrap bytes that arrived with an explicit name and media type.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Load a file from disk, inferring its media type from the extension.
    ///
    /// The size limit is checked against file metadata before reading, so an
    /// oversized file is rejected without being loaded into memory.
    pub async fn from_path(path: impl AsRef<Path>, config: &SpeechConfig) -> Result<Self, Pdf2SpeechError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_for_path(path);

        let meta = tokio::fs::metadata(path).await.map_err(|e| io_error(path, e))?;
        if !meta.is_file() {
            return Err(Pdf2SpeechError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        check_admission(&name, mime, meta.len(), config.max_file_bytes)?;

        let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
        debug!("Loaded {} ({} bytes)", name, bytes.len());
        Ok(Self::new(name, mime, bytes))
    }

    /// Display name (file name, no directory).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the raw contents.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Check type and size against `max_bytes`.
    pub fn validate(&self, max_bytes: u64) -> Result<(), Pdf2SpeechError> {
        check_admission(&self.name, &self.mime, self.size(), max_bytes)
    }

    /// The name without a trailing `.pdf`, used as the title of exported audio.
    pub fn title(&self) -> &str {
        let lower = self.name.to_ascii_lowercase();
        if lower.ends_with(".pdf") && self.name.len() > 4 {
            &self.name[..self.name.len() - 4]
        } else {
            &self.name
        }
    }
}

/// Media type a browser file picker would report for `path`.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("pdf") => PDF_MIME,
        Some("txt") => "text/plain",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

fn check_admission(name: &str, mime: &str, size: u64, max_bytes: u64) -> Result<(), Pdf2SpeechError> {
    if mime != PDF_MIME {
        return Err(Pdf2SpeechError::NotAPdf {
            name: name.to_string(),
            mime: mime.to_string(),
        });
    }
    if size > max_bytes {
        return Err(Pdf2SpeechError::FileTooLarge {
            name: name.to_string(),
            size,
            max: max_bytes,
        });
    }
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> Pdf2SpeechError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pdf2SpeechError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pdf2SpeechError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}
