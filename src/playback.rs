//! Transport controls for one piece of synthesized audio.
//!
//! [`PlaybackUnit`] wraps an [`AudioHandle`] and drives an [`AudioSink`]
//! (the device, or [`TimedSink`] when nothing is audible). While playing,
//! a background task samples the sink position once per second and
//! publishes it on a `watch` channel; readers see the last sample, not the
//! live position.

use crate::cache::AudioHandle;
use crate::error::Pdf2SpeechError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// How often the sampler reads the sink position.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Default step for [`PlaybackUnit::skip`] in the CLI and UI bindings.
pub const SKIP_SECONDS: f64 = 10.0;

/// Volume a new unit starts at.
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Something that can play audio.
///
/// Shaped after a `rodio::Sink`: the sink owns its clock, the unit only
/// issues commands and reads the position back.
pub trait AudioSink: Send {
    fn play(&mut self);
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn seek(&mut self, position: Duration);
    fn position(&self) -> Duration;
    /// Total length, if known.
    fn duration(&self) -> Option<Duration>;
    /// Effective output volume in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
}

/// A sink that plays nothing and advances a clock.
///
/// Uses `tokio::time::Instant`, so it follows a paused test clock.
#[derive(Debug, Clone)]
pub struct TimedSink {
    duration: Duration,
    offset: Duration,
    started: Option<Instant>,
    volume: f32,
}

impl TimedSink {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            offset: Duration::ZERO,
            started: None,
            volume: 1.0,
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl AudioSink for TimedSink {
    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.started = None;
    }

    fn is_paused(&self) -> bool {
        self.started.is_none()
    }

    fn seek(&mut self, position: Duration) {
        self.offset = position.min(self.duration);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn position(&self) -> Duration {
        let running = self.started.map(|t| t.elapsed()).unwrap_or_default();
        (self.offset + running).min(self.duration)
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }
}

/// Last sampled transport state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackProgress {
    pub position: Duration,
    pub duration: Option<Duration>,
    pub playing: bool,
}

type SharedSink = Arc<Mutex<Box<dyn AudioSink>>>;

fn lock(sink: &SharedSink) -> MutexGuard<'_, Box<dyn AudioSink>> {
    sink.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Play/pause, seek, skip, volume and export for one audio handle.
pub struct PlaybackUnit {
    handle: AudioHandle,
    title: String,
    sink: SharedSink,
    volume: f32,
    muted: bool,
    progress: Arc<watch::Sender<PlaybackProgress>>,
    sampler: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PlaybackUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackUnit")
            .field("handle", &self.handle)
            .field("title", &self.title)
            .field("volume", &self.volume)
            .field("muted", &self.muted)
            .field("progress", &*self.progress.borrow())
            .finish()
    }
}

impl PlaybackUnit {
    pub fn new(handle: AudioHandle, title: impl Into<String>, sink: Box<dyn AudioSink>) -> Self {
        let duration = sink.duration();
        let (tx, _) = watch::channel(PlaybackProgress {
            position: Duration::ZERO,
            duration,
            playing: false,
        });
        let mut unit = Self {
            handle,
            title: title.into(),
            sink: Arc::new(Mutex::new(sink)),
            volume: DEFAULT_VOLUME,
            muted: false,
            progress: Arc::new(tx),
            sampler: None,
        };
        unit.apply_volume();
        unit
    }

    pub fn handle(&self) -> &AudioHandle {
        &self.handle
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_playing(&self) -> bool {
        !lock(&self.sink).is_paused()
    }

    /// Last sampled progress.
    pub fn progress(&self) -> PlaybackProgress {
        *self.progress.borrow()
    }

    /// Receive every progress sample.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackProgress> {
        self.progress.subscribe()
    }

    /// Start or pause playback. Returns whether it is now playing.
    ///
    /// Starting spawns the sampler on the current Tokio runtime.
    pub fn toggle_play(&mut self) -> Result<bool, Pdf2SpeechError> {
        if self.is_playing() {
            self.stop_sampler();
            lock(&self.sink).pause();
            self.publish(false);
            debug!("Paused {}", self.handle.locator());
            return Ok(false);
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Pdf2SpeechError::Internal("playback needs a Tokio runtime".into()))?;
        {
            let mut sink = lock(&self.sink);
            if let Some(d) = sink.duration() {
                if sink.position() >= d {
                    sink.seek(Duration::ZERO);
                }
            }
            sink.play();
        }
        self.stop_sampler();
        self.sampler = Some(runtime.spawn(sample(Arc::clone(&self.sink), Arc::clone(&self.progress))));
        debug!("Playing {}", self.handle.locator());
        Ok(true)
    }

    /// Jump to `position`, clamped to `[0, duration]`.
    pub fn seek(&mut self, position: Duration) {
        let playing = {
            let mut sink = lock(&self.sink);
            let target = match sink.duration() {
                Some(d) => position.min(d),
                None => position,
            };
            sink.seek(target);
            !sink.is_paused()
        };
        self.publish(playing);
    }

    /// Move by `secs` seconds (negative goes back), clamped.
    pub fn skip(&mut self, secs: f64) {
        let current = lock(&self.sink).position().as_secs_f64();
        let target = Duration::try_from_secs_f64((current + secs).max(0.0)).unwrap_or(Duration::MAX);
        self.seek(target);
    }

    /// Set the volume in `[0, 1]`. Zero mutes; anything else unmutes.
    /// NaN and infinities are ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if !volume.is_finite() {
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
        self.muted = self.volume == 0.0;
        self.apply_volume();
    }

    /// Flip mute. The stored volume is untouched.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.apply_volume();
        self.muted
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Write the audio to `dir` under a name derived from the title.
    pub async fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf, Pdf2SpeechError> {
        export_audio(&self.handle, &self.title, dir).await
    }

    fn apply_volume(&mut self) {
        let effective = if self.muted { 0.0 } else { self.volume };
        lock(&self.sink).set_volume(effective);
    }

    fn publish(&self, playing: bool) {
        let sink = lock(&self.sink);
        self.progress.send_replace(PlaybackProgress {
            position: sink.position(),
            duration: sink.duration(),
            playing,
        });
    }

    fn stop_sampler(&mut self) {
        if let Some(task) = self.sampler.take() {
            task.abort();
        }
    }
}

impl Drop for PlaybackUnit {
    fn drop(&mut self) {
        self.stop_sampler();
    }
}

async fn sample(sink: SharedSink, progress: Arc<watch::Sender<PlaybackProgress>>) {
    let mut ticker = tokio::time::interval(SAMPLE_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let current = {
            let mut s = lock(&sink);
            let position = s.position();
            let duration = s.duration();
            let ended = duration.is_some_and(|d| position >= d);
            if ended {
                s.pause();
            }
            PlaybackProgress {
                position,
                duration,
                playing: !ended,
            }
        };
        progress.send_replace(current);
        if !current.playing {
            debug!("Playback reached the end");
            break;
        }
    }
}

// ── Export ───────────────────────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_UNSAFE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x08\x0e-\x1f\x7f]"#).unwrap());

/// File stem for a title: whitespace runs become `_`, characters that are
/// not allowed in file names are dropped.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = RE_UNSAFE.replace_all(title.trim(), "");
    let stem = RE_WHITESPACE.replace_all(&cleaned, "_");
    if stem.is_empty() {
        "audio".to_string()
    } else {
        stem.into_owned()
    }
}

/// Write `handle`'s bytes to `dir/<sanitized title>.<ext>`.
///
/// The file is written to a temporary name and renamed into place.
pub async fn export_audio(
    handle: &AudioHandle,
    title: &str,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, Pdf2SpeechError> {
    let dir = dir.as_ref();
    let ext = handle.encoding().extension();
    let path = dir.join(format!("{}.{}", sanitize_title(title), ext));

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Pdf2SpeechError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let tmp_path = path.with_extension(format!("{ext}.tmp"));
    tokio::fs::write(&tmp_path, handle.bytes())
        .await
        .map_err(|e| Pdf2SpeechError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| Pdf2SpeechError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!("Wrote {} ({} bytes)", path.display(), handle.len());
    Ok(path)
}
