//! Page → audio cache with explicit release.
//!
//! Every [`AudioHandle`] the cache hands out is released exactly once: when
//! it is replaced by newer audio for the same page, when the cache is
//! cleared, or when the cache is dropped. Release fires the optional
//! [`ReleaseHook`] (so a host can free whatever it built around the
//! locator, e.g. an object URL or a temp file) and makes the locator stop
//! resolving. Callers that cloned a handle keep their bytes alive; the
//! cache only promises it no longer holds them.

use crate::config::AudioEncoding;
use crate::pipeline::synthesize::AudioClip;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Opaque, unique identifier of one piece of synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioLocator(String);

impl AudioLocator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthesized audio for one page, or for the whole document when
/// [`AudioHandle::page`] is `None`.
#[derive(Clone)]
pub struct AudioHandle {
    page: Option<usize>,
    locator: AudioLocator,
    encoding: AudioEncoding,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle")
            .field("page", &self.page)
            .field("locator", &self.locator)
            .field("encoding", &self.encoding)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl AudioHandle {
    pub fn page(&self) -> Option<usize> {
        self.page
    }

    pub fn locator(&self) -> &AudioLocator {
        &self.locator
    }

    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Called with each handle the cache lets go of.
pub type ReleaseHook = Arc<dyn Fn(&AudioHandle) + Send + Sync>;

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

/// Mapping from page number to its current audio.
pub struct PageAudioCache {
    id: u64,
    pages: BTreeMap<usize, AudioHandle>,
    document: Option<AudioHandle>,
    release_hook: Option<ReleaseHook>,
    epoch: u64,
    next_serial: u64,
    released: u64,
}

impl fmt::Debug for PageAudioCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageAudioCache")
            .field("pages", &self.pages.keys().collect::<Vec<_>>())
            .field("document", &self.document.is_some())
            .field("epoch", &self.epoch)
            .field("released", &self.released)
            .finish()
    }
}

impl Default for PageAudioCache {
    fn default() -> Self {
        Self {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            pages: BTreeMap::new(),
            document: None,
            release_hook: None,
            epoch: 0,
            next_serial: 0,
            released: 0,
        }
    }
}

impl PageAudioCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache that calls `hook` for every released handle.
    pub fn with_release_hook(hook: ReleaseHook) -> Self {
        let mut cache = Self::default();
        cache.release_hook = Some(hook);
        cache
    }

    /// Wrap a clip in a handle with a fresh locator.
    ///
    /// The handle is not stored; pass it to [`put`](Self::put) or
    /// [`put_document`](Self::put_document).
    pub fn mint(&mut self, page: Option<usize>, clip: AudioClip) -> AudioHandle {
        self.next_serial += 1;
        let slot = page.map_or_else(|| "document".to_string(), |p| format!("page-{p}"));
        AudioHandle {
            page,
            locator: AudioLocator(format!(
                "audio:{}.{}/{}/{}",
                self.id, self.epoch, slot, self.next_serial
            )),
            encoding: clip.encoding,
            bytes: clip.bytes.into(),
        }
    }

    /// Store `handle` as the audio for `page_num`, releasing any previous one.
    pub fn put(&mut self, page_num: usize, handle: AudioHandle) {
        if let Some(old) = self.pages.insert(page_num, handle) {
            self.release(old);
        }
    }

    /// Store the whole-document audio, releasing any previous one.
    pub fn put_document(&mut self, handle: AudioHandle) {
        if let Some(old) = self.document.replace(handle) {
            self.release(old);
        }
    }

    /// Audio for `page_num`, if any.
    pub fn get(&self, page_num: usize) -> Option<&AudioHandle> {
        self.pages.get(&page_num)
    }

    /// Whole-document audio, if any.
    pub fn document(&self) -> Option<&AudioHandle> {
        self.document.as_ref()
    }

    /// Look up a live handle by locator. Released locators return `None`.
    pub fn resolve(&self, locator: &AudioLocator) -> Option<&AudioHandle> {
        self.pages
            .values()
            .chain(self.document.iter())
            .find(|h| &h.locator == locator)
    }

    /// Number of pages with audio.
    pub fn count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.document.is_none()
    }

    /// Page handles in ascending page order.
    pub fn pages(&self) -> impl Iterator<Item = &AudioHandle> {
        self.pages.values()
    }

    /// Handles released so far.
    pub fn released_count(&self) -> u64 {
        self.released
    }

    /// `"M of N pages converted"`.
    pub fn progress_label(&self, total_pages: usize) -> String {
        format!("{} of {} pages converted", self.count(), total_pages)
    }

    /// Release everything. Locators minted before the clear never collide
    /// with ones minted after it.
    pub fn clear(&mut self) {
        let pages = std::mem::take(&mut self.pages);
        for (_, handle) in pages {
            self.release(handle);
        }
        if let Some(doc) = self.document.take() {
            self.release(doc);
        }
        self.epoch += 1;
    }

    fn release(&mut self, handle: AudioHandle) {
        debug!("Releasing {}", handle.locator);
        self.released += 1;
        if let Some(ref hook) = self.release_hook {
            hook(&handle);
        }
    }
}

impl Drop for PageAudioCache {
    fn drop(&mut self) {
        self.clear();
    }
}
