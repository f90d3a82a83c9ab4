//! The select → extract → synthesize workflow and its session state.
//!
//! [`PipelineController`] owns the current [`Document`], its extracted
//! pages and the [`PageAudioCache`], and is the only thing that mutates
//! them. State lives behind a `std::sync::Mutex` that is never held across
//! an `.await`: each operation checks its guards and marks itself busy
//! under the lock, releases it for the extractor or synthesizer call, then
//! re-locks to commit the result.
//!
//! ## Single flight
//!
//! One extraction or synthesis runs at a time. A second `extract` or
//! `synthesize_*` call while one is outstanding is rejected with
//! [`Pdf2SpeechError::Busy`]; it is not queued. `select_file`, `reset`,
//! `back` and `change_page` are never blocked.
//!
//! ## Stale results
//!
//! Every document installed (and every extraction) starts a new
//! generation. A result that comes back for an older generation is dropped
//! and the call returns [`Pdf2SpeechError::Superseded`], which is logged
//! but never raised as a notice.

use crate::cache::{AudioHandle, AudioLocator, PageAudioCache, ReleaseHook};
use crate::config::{PageSelection, SpeechConfig, SynthesisOptions};
use crate::document::Document;
use crate::error::{PageError, Pdf2SpeechError, SynthesisError};
use crate::pipeline::extract::{PageExtractor, PageRecord};
use crate::pipeline::synthesize::{prepare_text, AudioClip, SpeechSynthesizer, Truncation};
use crate::progress::{NoopObserver, Notice, PipelineObserver};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Where the session is in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Upload,
    Review,
    Listen,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Upload => "upload",
            Step::Review => "review",
            Step::Listen => "listen",
        }
    }
}

/// Outcome of a batch synthesis that converted at least one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Pages with text that were sent to the synthesizer.
    pub attempted: usize,
    pub succeeded: usize,
    /// Per-page failures, in page order.
    pub failed: Vec<PageError>,
    /// Selected pages skipped because they have no text.
    pub skipped_empty: Vec<usize>,
    /// Pages whose text was cut before submission.
    pub truncated: Vec<usize>,
}

impl BatchReport {
    /// `"N of M pages converted"`.
    pub fn summary(&self) -> String {
        format!("{} of {} pages converted", self.succeeded, self.attempted)
    }
}

/// Read-only view of the session, for display and `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub step: Step,
    pub document: Option<String>,
    pub page_count: usize,
    pub selected_page: Option<usize>,
    pub converted_pages: Vec<usize>,
    pub has_document_audio: bool,
    pub processing: bool,
    pub processing_page: Option<usize>,
}

// ── Session state ────────────────────────────────────────────────────────

struct Workspace {
    document: Document,
    pages: Vec<PageRecord>,
    selected_page: usize,
    cache: PageAudioCache,
}

impl Workspace {
    fn record(&self, page: usize) -> Result<&PageRecord, Pdf2SpeechError> {
        let total = self.pages.len();
        if page == 0 || page > total {
            return Err(Pdf2SpeechError::PageOutOfRange { page, total });
        }
        let record = &self.pages[page - 1];
        if !record.has_text() {
            return Err(Pdf2SpeechError::NoText { page });
        }
        Ok(record)
    }
}

enum Stage {
    Upload { document: Option<Document> },
    Review(Workspace),
    Listen(Workspace),
}

impl Stage {
    fn step(&self) -> Step {
        match self {
            Stage::Upload { .. } => Step::Upload,
            Stage::Review(_) => Step::Review,
            Stage::Listen(_) => Step::Listen,
        }
    }

    fn document(&self) -> Option<&Document> {
        match self {
            Stage::Upload { document } => document.as_ref(),
            Stage::Review(ws) | Stage::Listen(ws) => Some(&ws.document),
        }
    }

    fn workspace(&self) -> Result<&Workspace, Pdf2SpeechError> {
        match self {
            Stage::Review(ws) | Stage::Listen(ws) => Ok(ws),
            Stage::Upload { document: Some(_) } => Err(Pdf2SpeechError::NoPages),
            Stage::Upload { document: None } => Err(Pdf2SpeechError::NoDocument),
        }
    }

    fn workspace_mut(&mut self) -> Option<&mut Workspace> {
        match self {
            Stage::Review(ws) | Stage::Listen(ws) => Some(ws),
            Stage::Upload { .. } => None,
        }
    }

    /// Review → Listen. Any other stage is left as is.
    fn promote(&mut self) {
        let current = std::mem::replace(self, Stage::Upload { document: None });
        *self = match current {
            Stage::Review(ws) => Stage::Listen(ws),
            other => other,
        };
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activity {
    Extracting,
    Page(usize),
    Batch { current: Option<usize> },
    Document,
}

impl Activity {
    fn describe(&self) -> String {
        match self {
            Activity::Extracting => "text extraction".to_string(),
            Activity::Page(p) => format!("synthesis of page {p}"),
            Activity::Batch { current: Some(p) } => format!("batch synthesis (page {p})"),
            Activity::Batch { current: None } => "batch synthesis".to_string(),
            Activity::Document => "whole-document synthesis".to_string(),
        }
    }

    fn page(&self) -> Option<usize> {
        match self {
            Activity::Page(p) => Some(*p),
            Activity::Batch { current } => *current,
            _ => None,
        }
    }
}

struct Session {
    stage: Stage,
    activity: Option<Activity>,
    generation: u64,
    options: SynthesisOptions,
}

struct BatchPlan {
    targets: Vec<(usize, String)>,
    skipped_empty: Vec<usize>,
    options: SynthesisOptions,
    generation: u64,
}

struct SingleJob {
    text: String,
    options: SynthesisOptions,
    generation: u64,
}

impl Session {
    fn ensure_idle(&self) -> Result<(), Pdf2SpeechError> {
        match self.activity {
            Some(a) => Err(Pdf2SpeechError::Busy {
                activity: a.describe(),
            }),
            None => Ok(()),
        }
    }

    fn begin_extract(&mut self) -> Result<(Document, u64), Pdf2SpeechError> {
        self.ensure_idle()?;
        let document = self
            .stage
            .document()
            .cloned()
            .ok_or(Pdf2SpeechError::NoDocument)?;
        self.activity = Some(Activity::Extracting);
        Ok((document, self.generation))
    }

    fn begin_page(&mut self, page: usize) -> Result<SingleJob, Pdf2SpeechError> {
        self.ensure_idle()?;
        let text = self.stage.workspace()?.record(page)?.text.clone();
        self.activity = Some(Activity::Page(page));
        Ok(SingleJob {
            text,
            options: self.options.clone(),
            generation: self.generation,
        })
    }

    fn begin_document(&mut self) -> Result<SingleJob, Pdf2SpeechError> {
        self.ensure_idle()?;
        let ws = self.stage.workspace()?;
        if ws.pages.is_empty() {
            return Err(Pdf2SpeechError::NoPages);
        }
        let text = ws
            .pages
            .iter()
            .filter(|p| p.has_text())
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        if text.is_empty() {
            return Err(Pdf2SpeechError::EmptySelection);
        }
        self.activity = Some(Activity::Document);
        Ok(SingleJob {
            text,
            options: self.options.clone(),
            generation: self.generation,
        })
    }

    fn begin_batch(&mut self, selection: &PageSelection) -> Result<BatchPlan, Pdf2SpeechError> {
        self.ensure_idle()?;
        let ws = self.stage.workspace()?;
        if ws.pages.is_empty() {
            return Err(Pdf2SpeechError::NoPages);
        }
        let mut targets = Vec::new();
        let mut skipped_empty = Vec::new();
        for page in selection.to_page_numbers(ws.pages.len()) {
            let record = &ws.pages[page - 1];
            if record.has_text() {
                targets.push((page, record.text.clone()));
            } else {
                skipped_empty.push(page);
            }
        }
        if targets.is_empty() {
            return Err(Pdf2SpeechError::EmptySelection);
        }
        self.activity = Some(Activity::Batch { current: None });
        Ok(BatchPlan {
            targets,
            skipped_empty,
            options: self.options.clone(),
            generation: self.generation,
        })
    }

    fn check_generation(&self, generation: u64, page: Option<usize>) -> Result<(), Pdf2SpeechError> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(Pdf2SpeechError::Superseded { page })
        }
    }

    /// Clear the busy flag if it still belongs to `generation`.
    fn finish(&mut self, generation: u64, page: Option<usize>) -> Result<(), Pdf2SpeechError> {
        self.check_generation(generation, page)?;
        self.activity = None;
        Ok(())
    }

    /// Store a clip under `page` (or the document slot). Returns the handle
    /// and whether it is the first audio of this workspace.
    fn store(
        &mut self,
        generation: u64,
        page: Option<usize>,
        clip: AudioClip,
    ) -> Result<(AudioHandle, bool), Pdf2SpeechError> {
        self.check_generation(generation, page)?;
        let ws = self
            .stage
            .workspace_mut()
            .ok_or(Pdf2SpeechError::Superseded { page })?;
        let first = ws.cache.is_empty();
        let handle = ws.cache.mint(page, clip);
        match page {
            Some(p) => ws.cache.put(p, handle.clone()),
            None => ws.cache.put_document(handle.clone()),
        }
        Ok((handle, first))
    }
}

// ── Controller ───────────────────────────────────────────────────────────

/// Orchestrates the three-step workflow for one document at a time.
pub struct PipelineController {
    config: SpeechConfig,
    extractor: Arc<dyn PageExtractor>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    observer: Arc<dyn PipelineObserver>,
    release_hook: Option<ReleaseHook>,
    session: Mutex<Session>,
}

impl PipelineController {
    /// Build with backends resolved from `config`.
    ///
    /// # Errors
    /// [`Pdf2SpeechError::CredentialMissing`] when no synthesizer is
    /// configured and no API key can be found.
    pub fn new(config: SpeechConfig) -> Result<Self, Pdf2SpeechError> {
        let extractor = crate::convert::resolve_extractor(&config);
        let synthesizer = crate::convert::resolve_synthesizer(&config)?;
        Ok(Self::with_backends(config, extractor, synthesizer))
    }

    /// Build with explicit backends.
    pub fn with_backends(
        config: SpeechConfig,
        extractor: Arc<dyn PageExtractor>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let observer = config
            .observer
            .clone()
            .unwrap_or_else(|| Arc::new(NoopObserver));
        Self {
            config,
            extractor,
            synthesizer,
            observer,
            release_hook: None,
            session: Mutex::new(Session {
                stage: Stage::Upload { document: None },
                activity: None,
                generation: 0,
                options: SynthesisOptions::default(),
            }),
        }
    }

    /// Call `hook` for every audio handle the session releases.
    ///
    /// The hook runs while the session is locked and must not call back
    /// into the controller.
    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release_hook = Some(hook);
        self
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    /// Per-call overrides applied to every following synthesis.
    pub fn set_options(&self, options: SynthesisOptions) {
        self.session().options = options;
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// Install a new document. Allowed from any step.
    ///
    /// A file that is not a PDF or is over the size limit is rejected and
    /// the session is left exactly as it was.
    pub fn select_file(&self, document: Document) -> Result<(), Pdf2SpeechError> {
        if let Err(e) = document.validate(self.config.max_file_bytes) {
            return self.fail(e);
        }
        info!("Selected {} ({} bytes)", document.name(), document.size());
        let previous = {
            let mut s = self.session();
            s.generation += 1;
            s.activity = None;
            std::mem::replace(
                &mut s.stage,
                Stage::Upload {
                    document: Some(document),
                },
            )
        };
        drop(previous);
        Ok(())
    }

    /// Extract page text from the selected document and move to Review.
    ///
    /// Running it again on the same document replaces the pages and clears
    /// all audio. On failure the session keeps its current step.
    pub async fn extract(&self) -> Result<usize, Pdf2SpeechError> {
        let begun = self.session().begin_extract();
        let (document, generation) = match begun {
            Ok(v) => v,
            Err(e) => return self.fail(e),
        };

        self.notify(Notice::info(format!("Extracting text from {}", document.name())));
        let result = self.extractor.extract(document.shared_bytes()).await;

        // Clear busy and install the workspace under one lock.
        let mut s = self.session();
        if let Err(e) = s.finish(generation, None) {
            drop(s);
            return self.fail(e);
        }

        let pages = match result {
            Ok(pages) => pages,
            Err(e) => {
                drop(s);
                return self.fail(Pdf2SpeechError::extraction(document.name(), e));
            }
        };

        let count = pages.len();
        let with_text = pages.iter().filter(|p| p.has_text()).count();
        info!("Extracted {} pages ({} with text)", count, with_text);

        let workspace = Workspace {
            document,
            pages,
            selected_page: 1,
            cache: self.new_cache(),
        };
        s.generation += 1;
        let previous = std::mem::replace(&mut s.stage, Stage::Review(workspace));
        drop(s);
        drop(previous);

        self.notify(Notice::success(format!("Extracted text from {count} pages")));
        Ok(count)
    }

    /// Synthesize one page and cache its audio, replacing any earlier audio
    /// for that page. The first audio of a document moves Review → Listen.
    pub async fn synthesize_page(&self, page: usize) -> Result<AudioHandle, Pdf2SpeechError> {
        let begun = self.session().begin_page(page);
        let job = match begun {
            Ok(job) => job,
            Err(e) => return self.fail(e),
        };
        debug!("Synthesizing page {}", page);
        self.finish_single(Some(page), job).await
    }

    /// Synthesize the text of every page as one request (pages joined by a
    /// blank line) into the document audio slot.
    pub async fn synthesize_document(&self) -> Result<AudioHandle, Pdf2SpeechError> {
        let begun = self.session().begin_document();
        let job = match begun {
            Ok(job) => job,
            Err(e) => return self.fail(e),
        };
        debug!("Synthesizing whole document ({} chars)", job.text.chars().count());
        self.finish_single(None, job).await
    }

    /// Synthesize every page that has text.
    pub async fn synthesize_all(&self) -> Result<BatchReport, Pdf2SpeechError> {
        self.synthesize_selection(&PageSelection::All).await
    }

    /// Synthesize the selected pages in ascending order, one at a time.
    ///
    /// A page that fails is recorded in the report and the batch moves on.
    /// If at least one page succeeds the session moves to Listen; if every
    /// page fails the call returns [`Pdf2SpeechError::AllPagesFailed`] and
    /// the step is unchanged.
    pub async fn synthesize_selection(
        &self,
        selection: &PageSelection,
    ) -> Result<BatchReport, Pdf2SpeechError> {
        let begun = self.session().begin_batch(selection);
        let plan = match begun {
            Ok(plan) => plan,
            Err(e) => return self.fail(e),
        };

        let total = plan.targets.len();
        info!(
            "Synthesizing {} pages ({} without text skipped)",
            total,
            plan.skipped_empty.len()
        );
        self.observer.on_batch_start(total);

        let mut report = BatchReport {
            attempted: total,
            succeeded: 0,
            failed: Vec::new(),
            skipped_empty: plan.skipped_empty.clone(),
            truncated: Vec::new(),
        };

        for (page, text) in &plan.targets {
            let page = *page;
            let marked = {
                let mut s = self.session();
                s.check_generation(plan.generation, Some(page)).map(|()| {
                    s.activity = Some(Activity::Batch {
                        current: Some(page),
                    });
                })
            };
            if let Err(e) = marked {
                self.observer.on_batch_complete(total, report.succeeded);
                return self.fail(e);
            }

            self.observer.on_page_start(page, total);
            let (result, truncation) = self.run_synthesis(Some(page), text, &plan.options).await;
            if truncation.is_some() {
                report.truncated.push(page);
            }

            match result {
                Ok(clip) => {
                    let stored = self.session().store(plan.generation, Some(page), clip);
                    let (handle, _) = match stored {
                        Ok(v) => v,
                        Err(e) => {
                            self.observer.on_batch_complete(total, report.succeeded);
                            return self.fail(e);
                        }
                    };
                    report.succeeded += 1;
                    debug!("Page {}: {} audio bytes", page, handle.len());
                    self.observer.on_page_complete(page, total, handle.len());
                }
                Err(e) => {
                    warn!("Page {}: synthesis failed: {}", page, e);
                    self.observer.on_page_error(page, total, &e.to_string());
                    report.failed.push(PageError::SynthesisFailed {
                        page,
                        detail: e.to_string(),
                    });
                }
            }
        }

        self.observer.on_batch_complete(total, report.succeeded);

        let finished = {
            let mut s = self.session();
            s.finish(plan.generation, None).map(|()| {
                if report.succeeded > 0 {
                    s.stage.promote();
                }
            })
        };
        if let Err(e) = finished {
            return self.fail(e);
        }

        if report.succeeded == 0 {
            let first_error = report
                .failed
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            return self.fail(Pdf2SpeechError::AllPagesFailed { total, first_error });
        }

        info!("{}", report.summary());
        self.notify(Notice::success(report.summary()));
        Ok(report)
    }

    /// Move the page cursor. Out-of-range pages leave it where it is.
    pub fn change_page(&self, page: usize) -> Result<(), Pdf2SpeechError> {
        let changed = {
            let mut s = self.session();
            let step = s.stage.step();
            match s.stage.workspace_mut() {
                None => Err(Pdf2SpeechError::InvalidTransition {
                    stage: step.as_str(),
                    action: "change page",
                }),
                Some(ws) if page == 0 || page > ws.pages.len() => {
                    Err(Pdf2SpeechError::PageOutOfRange {
                        page,
                        total: ws.pages.len(),
                    })
                }
                Some(ws) => {
                    ws.selected_page = page;
                    Ok(())
                }
            }
        };
        changed.or_else(|e| self.fail(e))
    }

    /// Step backwards: Listen → Review keeps pages and audio; Review →
    /// Upload keeps only the document.
    pub fn back(&self) -> Result<Step, Pdf2SpeechError> {
        let outcome = {
            let mut s = self.session();
            let current = std::mem::replace(&mut s.stage, Stage::Upload { document: None });
            match current {
                Stage::Listen(ws) => {
                    s.stage = Stage::Review(ws);
                    Ok((Step::Review, None))
                }
                Stage::Review(ws) => {
                    s.generation += 1;
                    s.activity = None;
                    s.stage = Stage::Upload {
                        document: Some(ws.document.clone()),
                    };
                    Ok((Step::Upload, Some(ws)))
                }
                upload @ Stage::Upload { .. } => {
                    s.stage = upload;
                    Err(Pdf2SpeechError::InvalidTransition {
                        stage: Step::Upload.as_str(),
                        action: "go back",
                    })
                }
            }
        };
        match outcome {
            Ok((step, dropped)) => {
                drop(dropped);
                debug!("Back to {}", step.as_str());
                Ok(step)
            }
            Err(e) => self.fail(e),
        }
    }

    /// Discard the document, pages and audio. Allowed from any step.
    pub fn reset(&self) {
        let previous = {
            let mut s = self.session();
            s.generation += 1;
            s.activity = None;
            std::mem::replace(&mut s.stage, Stage::Upload { document: None })
        };
        drop(previous);
        info!("Session reset");
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn step(&self) -> Step {
        self.session().stage.step()
    }

    pub fn document(&self) -> Option<Document> {
        self.session().stage.document().cloned()
    }

    /// Extracted pages; empty before extraction.
    pub fn pages(&self) -> Vec<PageRecord> {
        self.session()
            .stage
            .workspace()
            .map(|ws| ws.pages.clone())
            .unwrap_or_default()
    }

    pub fn selected_page(&self) -> Option<usize> {
        self.session().stage.workspace().ok().map(|ws| ws.selected_page)
    }

    pub fn audio(&self, page: usize) -> Option<AudioHandle> {
        self.session()
            .stage
            .workspace()
            .ok()
            .and_then(|ws| ws.cache.get(page).cloned())
    }

    pub fn document_audio(&self) -> Option<AudioHandle> {
        self.session()
            .stage
            .workspace()
            .ok()
            .and_then(|ws| ws.cache.document().cloned())
    }

    /// All page audio in ascending page order.
    pub fn page_audio(&self) -> Vec<AudioHandle> {
        self.session()
            .stage
            .workspace()
            .map(|ws| ws.cache.pages().cloned().collect())
            .unwrap_or_default()
    }

    pub fn resolve(&self, locator: &AudioLocator) -> Option<AudioHandle> {
        self.session()
            .stage
            .workspace()
            .ok()
            .and_then(|ws| ws.cache.resolve(locator).cloned())
    }

    /// Pages with audio.
    pub fn audio_count(&self) -> usize {
        self.session()
            .stage
            .workspace()
            .map(|ws| ws.cache.count())
            .unwrap_or(0)
    }

    /// `"M of N pages converted"`, once pages exist.
    pub fn progress_label(&self) -> Option<String> {
        self.session()
            .stage
            .workspace()
            .ok()
            .map(|ws| ws.cache.progress_label(ws.pages.len()))
    }

    pub fn is_processing(&self) -> bool {
        self.session().activity.is_some()
    }

    pub fn processing_page(&self) -> Option<usize> {
        self.session().activity.and_then(|a| a.page())
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let s = self.session();
        let ws = s.stage.workspace().ok();
        PipelineSnapshot {
            step: s.stage.step(),
            document: s.stage.document().map(|d| d.name().to_string()),
            page_count: ws.map(|w| w.pages.len()).unwrap_or(0),
            selected_page: ws.map(|w| w.selected_page),
            converted_pages: ws
                .map(|w| w.cache.pages().filter_map(|h| h.page()).collect())
                .unwrap_or_default(),
            has_document_audio: ws.is_some_and(|w| w.cache.document().is_some()),
            processing: s.activity.is_some(),
            processing_page: s.activity.and_then(|a| a.page()),
        }
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_cache(&self) -> PageAudioCache {
        match self.release_hook {
            Some(ref hook) => PageAudioCache::with_release_hook(Arc::clone(hook)),
            None => PageAudioCache::new(),
        }
    }

    fn notify(&self, notice: Notice) {
        self.observer.on_notice(&notice);
    }

    fn fail<T>(&self, e: Pdf2SpeechError) -> Result<T, Pdf2SpeechError> {
        if e.is_user_visible() {
            self.notify(Notice::error(e.to_string()));
        } else {
            debug!("{}", e);
        }
        Err(e)
    }

    async fn run_synthesis(
        &self,
        page: Option<usize>,
        text: &str,
        options: &SynthesisOptions,
    ) -> (Result<AudioClip, SynthesisError>, Option<Truncation>) {
        let prepared = prepare_text(text, self.config.max_text_chars);
        if let Some(t) = prepared.truncation {
            let subject = match page {
                Some(p) => format!("Page {p}"),
                None => "The document".to_string(),
            };
            self.notify(Notice::warning(format!(
                "{} has {} characters; only the first {} will be read aloud",
                subject, t.original_chars, t.submitted_chars
            )));
        }
        let result = self.synthesizer.synthesize(&prepared.text, options).await;
        (result, prepared.truncation)
    }

    async fn finish_single(
        &self,
        page: Option<usize>,
        job: SingleJob,
    ) -> Result<AudioHandle, Pdf2SpeechError> {
        let (result, _) = self.run_synthesis(page, &job.text, &job.options).await;

        let committed = {
            let mut s = self.session();
            s.finish(job.generation, page).and_then(|()| match result {
                Ok(clip) => {
                    let (handle, first) = s.store(job.generation, page, clip)?;
                    if first {
                        s.stage.promote();
                    }
                    Ok(handle)
                }
                Err(source) => Err(Pdf2SpeechError::Synthesis { page, source }),
            })
        };

        match committed {
            Ok(handle) => {
                let what = match page {
                    Some(p) => format!("page {p}"),
                    None => "the document".to_string(),
                };
                info!("Audio ready for {} ({} bytes)", what, handle.len());
                self.notify(Notice::success(format!("Audio generated for {what}")));
                Ok(handle)
            }
            Err(e) => {
                if let Pdf2SpeechError::Synthesis { ref source, .. } = e {
                    warn!("Synthesis failed: {}", source);
                }
                self.fail(e)
            }
        }
    }
}
