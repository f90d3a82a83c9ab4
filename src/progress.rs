//! Observer trait for pipeline notices and per-page batch events.
//!
//! Inject an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::SpeechConfigBuilder::observer`] to receive the
//! transient, user-facing notifications the controller emits (validation
//! failures, truncation warnings, "N of M pages converted") together with
//! per-page events while a batch runs.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2speech::{Notice, PipelineObserver, SpeechConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     completed: AtomicUsize,
//! }
//!
//! impl PipelineObserver for CountingObserver {
//!     fn on_page_complete(&self, page_num: usize, total: usize, audio_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {} of {} done ({} bytes)", page_num, total, audio_bytes);
//!     }
//!
//!     fn on_notice(&self, notice: &Notice) {
//!         eprintln!("[{:?}] {}", notice.level, notice.message);
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { completed: AtomicUsize::new(0) });
//!
//! let config = SpeechConfig::builder()
//!     .observer(observer as Arc<dyn PipelineObserver>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Called by the controller as it moves through the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Batch events arrive in ascending page order, one
/// page at a time.
pub trait PipelineObserver: Send + Sync {
    /// A user-facing notification.
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }

    /// Called once before a batch synthesizes its first page.
    ///
    /// # Arguments
    /// * `total`: pages with text that will be attempted
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before a page's text is sent to the synthesizer.
    fn on_page_start(&self, page_num: usize, total: usize) {
        let _ = (page_num, total);
    }

    /// Called when a page's audio is stored.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total`      : pages attempted in this batch
    /// * `audio_bytes`: length of the decoded audio
    fn on_page_complete(&self, page_num: usize, total: usize, audio_bytes: usize) {
        let _ = (page_num, total, audio_bytes);
    }

    /// Called when a page fails. The batch carries on.
    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let _ = (page_num, total, error);
    }

    /// Called once after every page of the batch has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// Observer that ignores everything. Used when none is configured.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::SpeechConfig`].
pub type SharedObserver = Arc<dyn PipelineObserver>;
