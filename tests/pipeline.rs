//! Workflow tests for the pipeline controller.
//!
//! Extraction and synthesis are replaced with in-memory fakes, so these run
//! without pdfium or network access.

use async_trait::async_trait;
use edgequake_pdf2speech::config::PDF_MIME;
use edgequake_pdf2speech::{
    convert_to_dir, AudioClip, AudioHandle, AudioEncoding, Document, ExtractionError, Notice, NoticeLevel,
    PageExtractor, PageRecord, PageSelection, Pdf2SpeechError, PipelineController,
    PipelineObserver, SpeechConfig, SpeechSynthesizer, Step, SynthesisError, SynthesisOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns the same pages for any input.
struct FixedPages(Vec<String>);

impl FixedPages {
    fn new(texts: &[&str]) -> Arc<Self> {
        Arc::new(Self(texts.iter().map(|t| t.to_string()).collect()))
    }
}

#[async_trait]
impl PageExtractor for FixedPages {
    async fn extract(&self, _pdf: Arc<[u8]>) -> Result<Vec<PageRecord>, ExtractionError> {
        Ok(self
            .0
            .iter()
            .enumerate()
            .map(|(i, text)| PageRecord {
                page_num: i + 1,
                text: text.clone(),
            })
            .collect())
    }
}

/// Like [`FixedPages`], but holds every call until the gate is notified.
struct GatedPages {
    pages: Arc<FixedPages>,
    gate: Arc<Notify>,
}

#[async_trait]
impl PageExtractor for GatedPages {
    async fn extract(&self, pdf: Arc<[u8]>) -> Result<Vec<PageRecord>, ExtractionError> {
        self.gate.notified().await;
        self.pages.extract(pdf).await
    }
}

struct BrokenPdf;

#[async_trait]
impl PageExtractor for BrokenPdf {
    async fn extract(&self, _pdf: Arc<[u8]>) -> Result<Vec<PageRecord>, ExtractionError> {
        Err(ExtractionError::Unreadable("no trailer found".into()))
    }
}

/// Echoes the text back as audio bytes. Text containing `FAIL` is rejected.
/// An optional gate holds every call until it is notified.
#[derive(Default)]
struct EchoSynth {
    received: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl EchoSynth {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for EchoSynth {
    async fn synthesize(
        &self,
        text: &str,
        _options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().unwrap().push(text.to_string());
        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        if text.contains("FAIL") {
            return Err(SynthesisError::Http {
                status: 400,
                body: "rejected".into(),
            });
        }
        Ok(AudioClip {
            bytes: format!("audio:{text}").into_bytes(),
            encoding: AudioEncoding::Mp3,
        })
    }
}

#[derive(Default)]
struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
    batches_done: AtomicUsize,
}

impl NoticeLog {
    fn levels(&self) -> Vec<NoticeLevel> {
        self.notices.lock().unwrap().iter().map(|n| n.level).collect()
    }

    fn messages(&self) -> Vec<String> {
        self.notices.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }
}

impl PipelineObserver for NoticeLog {
    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn on_batch_complete(&self, _total: usize, _success_count: usize) {
        self.batches_done.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn pdf(name: &str) -> Document {
    Document::new(name, PDF_MIME, b"%PDF-1.7\n".to_vec())
}

fn controller(pages: &[&str], synth: Arc<EchoSynth>) -> PipelineController {
    let config = SpeechConfig::builder().build().unwrap();
    PipelineController::with_backends(config, FixedPages::new(pages), synth)
}

fn observed(pages: &[&str], synth: Arc<EchoSynth>) -> (PipelineController, Arc<NoticeLog>) {
    let log = Arc::new(NoticeLog::default());
    let config = SpeechConfig::builder()
        .observer(log.clone())
        .build()
        .unwrap();
    let ctl = PipelineController::with_backends(config, FixedPages::new(pages), synth);
    (ctl, log)
}

async fn in_review(pages: &[&str], synth: Arc<EchoSynth>) -> PipelineController {
    let ctl = controller(pages, synth);
    assert_ok!(ctl.select_file(pdf("book.pdf")));
    assert_ok!(ctl.extract().await);
    ctl
}

async fn wait_until_busy(ctl: &PipelineController) {
    for _ in 0..100 {
        if ctl.is_processing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("controller never became busy");
}

// ── Happy path ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn three_page_document_flow() {
    let synth = EchoSynth::new();
    let ctl = controller(&["Olá mundo.", "Segunda página.", "Fim."], synth.clone());
    assert_eq!(ctl.step(), Step::Upload);

    assert_ok!(ctl.select_file(pdf("Meu Livro.pdf")));
    assert_eq!(ctl.step(), Step::Upload);
    assert_eq!(ctl.extract().await.unwrap(), 3);
    assert_eq!(ctl.step(), Step::Review);
    assert_eq!(ctl.selected_page(), Some(1));

    let handle = ctl.synthesize_page(2).await.unwrap();
    assert_eq!(handle.page(), Some(2));
    assert_eq!(handle.bytes(), "audio:Segunda página.".as_bytes());
    assert_eq!(ctl.step(), Step::Listen);
    assert_eq!(ctl.audio_count(), 1);
    assert_eq!(ctl.progress_label().as_deref(), Some("1 of 3 pages converted"));
    assert_eq!(
        ctl.resolve(handle.locator()).map(|h| h.page()),
        Some(Some(2))
    );
    assert_eq!(synth.received(), vec!["Segunda página.".to_string()]);
}

#[tokio::test]
async fn regenerating_a_page_replaces_its_audio() {
    let released = Arc::new(AtomicUsize::new(0));
    let counter = released.clone();
    let ctl = controller(&["um", "dois"], EchoSynth::new()).with_release_hook(Arc::new(
        move |_: &AudioHandle| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    ));
    assert_ok!(ctl.select_file(pdf("a.pdf")));
    assert_ok!(ctl.extract().await);

    let first = ctl.synthesize_page(1).await.unwrap();
    let second = ctl.synthesize_page(1).await.unwrap();

    assert_ne!(first.locator(), second.locator());
    assert_eq!(ctl.audio_count(), 1);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(ctl.resolve(first.locator()).is_none());
    assert!(ctl.resolve(second.locator()).is_some());
}

#[tokio::test]
async fn batch_reports_partial_success() {
    let (ctl, log) = observed(&["um", "FAIL dois", "", "quatro"], EchoSynth::new());
    assert_ok!(ctl.select_file(pdf("a.pdf")));
    assert_ok!(ctl.extract().await);

    let report = ctl.synthesize_all().await.unwrap();
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped_empty, vec![3]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].page(), 2);
    assert_eq!(report.summary(), "2 of 3 pages converted");

    assert_eq!(ctl.step(), Step::Listen);
    assert!(ctl.audio(1).is_some());
    assert!(ctl.audio(2).is_none());
    assert!(ctl.audio(4).is_some());
    assert_eq!(
        ctl.page_audio().iter().map(|h| h.page()).collect::<Vec<_>>(),
        vec![Some(1), Some(4)]
    );
    assert_eq!(log.levels().last(), Some(&NoticeLevel::Success));
}

#[tokio::test]
async fn batch_where_every_page_fails_stays_in_review() {
    let (ctl, log) = observed(&["FAIL a", "FAIL b"], EchoSynth::new());
    assert_ok!(ctl.select_file(pdf("a.pdf")));
    assert_ok!(ctl.extract().await);

    let err = ctl.synthesize_all().await.unwrap_err();
    assert!(
        matches!(err, Pdf2SpeechError::AllPagesFailed { total: 2, .. }),
        "got: {err}"
    );
    assert_eq!(ctl.step(), Step::Review);
    assert_eq!(ctl.audio_count(), 0);
    assert!(!ctl.is_processing());
    assert_eq!(log.levels().last(), Some(&NoticeLevel::Error));
}

#[tokio::test]
async fn selection_with_no_text_is_rejected() {
    let ctl = in_review(&["um", "  \n", ""], EchoSynth::new()).await;
    let err = assert_err!(ctl.synthesize_selection(&PageSelection::Range(2, 3)).await);
    assert!(matches!(err, Pdf2SpeechError::EmptySelection));
    assert!(!ctl.is_processing());
}

#[tokio::test]
async fn whole_document_is_one_request() {
    let synth = EchoSynth::new();
    let ctl = in_review(&["Primeira.", "", "Terceira."], synth.clone()).await;

    let handle = ctl.synthesize_document().await.unwrap();
    assert_eq!(handle.page(), None);
    assert_eq!(synth.received(), vec!["Primeira.\n\nTerceira.".to_string()]);
    assert_eq!(ctl.step(), Step::Listen);
    assert!(ctl.document_audio().is_some());
}

// ── Text limits ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn long_page_is_cut_to_limit_with_a_warning() {
    let long = "a".repeat(6000);
    let synth = EchoSynth::new();
    let (ctl, log) = observed(&[long.as_str()], synth.clone());
    assert_ok!(ctl.select_file(pdf("a.pdf")));
    assert_ok!(ctl.extract().await);

    let report = ctl.synthesize_all().await.unwrap();
    assert_eq!(report.truncated, vec![1]);

    let sent = synth.received();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chars().count(), 4800);
    assert!(log.levels().contains(&NoticeLevel::Warning));
    assert!(log.messages().iter().any(|m| m.contains("6000")));
}

#[tokio::test]
async fn failed_page_keeps_step_and_other_audio() {
    let ctl = in_review(&["um", "FAIL dois"], EchoSynth::new()).await;

    let err = assert_err!(ctl.synthesize_page(2).await);
    assert!(
        matches!(err, Pdf2SpeechError::Synthesis { page: Some(2), .. }),
        "got: {err}"
    );
    assert_eq!(ctl.step(), Step::Review);
    assert!(!ctl.is_processing());

    let first = ctl.synthesize_page(1).await.unwrap();
    assert_eq!(ctl.step(), Step::Listen);

    assert_err!(ctl.synthesize_page(2).await);
    assert_eq!(ctl.step(), Step::Listen);
    assert!(!ctl.is_processing());
    assert_eq!(ctl.audio_count(), 1);
    assert_eq!(
        ctl.audio(1).map(|h| h.locator().clone()),
        Some(first.locator().clone())
    );
    assert!(ctl.audio(2).is_none());
}

#[tokio::test]
async fn page_without_text_is_not_sent() {
    let synth = EchoSynth::new();
    let ctl = in_review(&["um", "   "], synth.clone()).await;

    let err = assert_err!(ctl.synthesize_page(2).await);
    assert!(matches!(err, Pdf2SpeechError::NoText { page: 2 }));
    assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    assert_eq!(ctl.step(), Step::Review);
}

// ── Admission ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn oversized_file_leaves_session_untouched() {
    let ctl = in_review(&["um"], EchoSynth::new()).await;
    let big = Document::new("big.pdf", PDF_MIME, vec![0u8; 12 * 1024 * 1024]);

    let err = assert_err!(ctl.select_file(big));
    assert!(matches!(err, Pdf2SpeechError::FileTooLarge { .. }));
    assert_eq!(ctl.step(), Step::Review);
    assert_eq!(ctl.document().map(|d| d.name().to_string()).as_deref(), Some("book.pdf"));
}

#[tokio::test]
async fn non_pdf_and_oversized_files_are_rejected() {
    let ctl = controller(&["um"], EchoSynth::new());
    let txt = Document::new("notes.txt", "text/plain", b"hello".to_vec());

    let err = assert_err!(ctl.select_file(txt));
    assert!(matches!(err, Pdf2SpeechError::NotAPdf { .. }));
    assert!(ctl.document().is_none());
    assert_eq!(ctl.step(), Step::Upload);

    let big = Document::new("big.pdf", PDF_MIME, vec![0u8; 12 * 1024 * 1024]);
    assert!(matches!(
        ctl.select_file(big),
        Err(Pdf2SpeechError::FileTooLarge { .. })
    ));
    assert!(ctl.document().is_none());
    assert_eq!(ctl.step(), Step::Upload);
}

#[tokio::test]
async fn unreadable_pdf_stays_in_upload() {
    let config = SpeechConfig::builder().build().unwrap();
    let ctl = PipelineController::with_backends(config, Arc::new(BrokenPdf), EchoSynth::new());
    assert_ok!(ctl.select_file(pdf("broken.pdf")));

    let err = assert_err!(ctl.extract().await);
    assert!(matches!(err, Pdf2SpeechError::ExtractionFailed { .. }), "got: {err}");
    assert_eq!(ctl.step(), Step::Upload);
    assert!(!ctl.is_processing());
}

#[tokio::test]
async fn extract_without_document() {
    let ctl = controller(&["um"], EchoSynth::new());
    assert!(matches!(ctl.extract().await, Err(Pdf2SpeechError::NoDocument)));
}

// ── Navigation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_clears_everything() {
    let ctl = in_review(&["um", "dois"], EchoSynth::new()).await;
    assert_ok!(ctl.synthesize_page(1).await);

    ctl.reset();
    assert_eq!(ctl.step(), Step::Upload);
    assert!(ctl.document().is_none());
    assert!(ctl.pages().is_empty());
    assert_eq!(ctl.audio_count(), 0);
    assert!(ctl.progress_label().is_none());
}

#[tokio::test]
async fn back_from_listen_keeps_audio() {
    let ctl = in_review(&["um", "dois"], EchoSynth::new()).await;
    assert_ok!(ctl.synthesize_page(1).await);
    assert_eq!(ctl.step(), Step::Listen);

    assert_eq!(ctl.back().unwrap(), Step::Review);
    assert_eq!(ctl.audio_count(), 1);
    assert_eq!(ctl.pages().len(), 2);

    assert_eq!(ctl.back().unwrap(), Step::Upload);
    assert_eq!(ctl.document().map(|d| d.name().to_string()).as_deref(), Some("book.pdf"));
    assert!(ctl.pages().is_empty());
    assert_eq!(ctl.audio_count(), 0);

    assert!(matches!(
        ctl.back(),
        Err(Pdf2SpeechError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn change_page_checks_range() {
    let ctl = controller(&["um", "dois"], EchoSynth::new());
    assert!(matches!(
        ctl.change_page(1),
        Err(Pdf2SpeechError::InvalidTransition { .. })
    ));

    assert_ok!(ctl.select_file(pdf("a.pdf")));
    assert_ok!(ctl.extract().await);
    assert_ok!(ctl.change_page(2));
    assert_eq!(ctl.selected_page(), Some(2));

    assert!(matches!(
        ctl.change_page(3),
        Err(Pdf2SpeechError::PageOutOfRange { page: 3, total: 2 })
    ));
    assert_eq!(ctl.selected_page(), Some(2));
}

// ── Concurrency ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_request_while_busy_is_rejected() {
    let gate = Arc::new(Notify::new());
    let ctl = Arc::new(in_review(&["um", "dois"], EchoSynth::gated(gate.clone())).await);

    let running = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.synthesize_page(1).await })
    };
    wait_until_busy(&ctl).await;
    assert_eq!(ctl.processing_page(), Some(1));

    let err = assert_err!(ctl.synthesize_page(2).await);
    assert!(matches!(err, Pdf2SpeechError::Busy { .. }), "got: {err}");
    assert!(matches!(
        ctl.extract().await,
        Err(Pdf2SpeechError::Busy { .. })
    ));

    gate.notify_one();
    let handle = running.await.unwrap().unwrap();
    assert_eq!(handle.page(), Some(1));
    assert!(!ctl.is_processing());
    assert!(ctl.audio(2).is_none());
}

#[tokio::test]
async fn result_for_replaced_document_is_discarded() {
    let gate = Arc::new(Notify::new());
    let synth = EchoSynth::gated(gate.clone());
    let (ctl, log) = observed(&["um", "dois"], synth);
    let ctl = Arc::new(ctl);
    assert_ok!(ctl.select_file(pdf("old.pdf")));
    assert_ok!(ctl.extract().await);

    let running = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.synthesize_page(1).await })
    };
    wait_until_busy(&ctl).await;

    assert_ok!(ctl.select_file(pdf("new.pdf")));
    assert!(!ctl.is_processing());
    let errors_before = log
        .levels()
        .iter()
        .filter(|l| **l == NoticeLevel::Error)
        .count();

    gate.notify_one();
    let result = running.await.unwrap();
    assert!(matches!(result, Err(Pdf2SpeechError::Superseded { page: Some(1) })));

    assert_eq!(ctl.step(), Step::Upload);
    assert_eq!(ctl.document().map(|d| d.name().to_string()).as_deref(), Some("new.pdf"));
    assert_eq!(ctl.audio_count(), 0);
    let errors_after = log
        .levels()
        .iter()
        .filter(|l| **l == NoticeLevel::Error)
        .count();
    assert_eq!(errors_before, errors_after);
}

#[tokio::test]
async fn new_file_during_batch_discards_its_results() {
    let gate = Arc::new(Notify::new());
    let synth = EchoSynth::gated(gate.clone());
    let (ctl, log) = observed(&["um", "dois", "três"], synth.clone());
    let ctl = Arc::new(ctl);
    assert_ok!(ctl.select_file(pdf("old.pdf")));
    assert_ok!(ctl.extract().await);

    let running = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.synthesize_all().await })
    };
    wait_until_busy(&ctl).await;

    assert_ok!(ctl.select_file(pdf("new.pdf")));
    gate.notify_one();
    let result = running.await.unwrap();
    assert!(
        matches!(result, Err(Pdf2SpeechError::Superseded { page: Some(1) })),
        "got: {result:?}"
    );

    assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.batches_done.load(Ordering::SeqCst), 1);
    assert!(!ctl.is_processing());
    assert_eq!(ctl.step(), Step::Upload);
    assert_eq!(ctl.audio_count(), 0);

    assert_eq!(ctl.extract().await.unwrap(), 3);
    assert_eq!(ctl.document().map(|d| d.name().to_string()).as_deref(), Some("new.pdf"));
}

#[tokio::test]
async fn reset_during_batch_discards_its_results() {
    let gate = Arc::new(Notify::new());
    let (ctl, log) = observed(&["um", "dois"], EchoSynth::gated(gate.clone()));
    let ctl = Arc::new(ctl);
    assert_ok!(ctl.select_file(pdf("a.pdf")));
    assert_ok!(ctl.extract().await);

    let running = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.synthesize_all().await })
    };
    wait_until_busy(&ctl).await;

    ctl.reset();
    gate.notify_one();
    assert!(matches!(
        running.await.unwrap(),
        Err(Pdf2SpeechError::Superseded { .. })
    ));
    assert_eq!(log.batches_done.load(Ordering::SeqCst), 1);
    assert_eq!(ctl.step(), Step::Upload);
    assert!(ctl.document().is_none());
    assert!(!ctl.is_processing());
}

#[tokio::test]
async fn reset_during_extract_discards_pages() {
    let gate = Arc::new(Notify::new());
    let extractor = Arc::new(GatedPages {
        pages: FixedPages::new(&["um", "dois"]),
        gate: gate.clone(),
    });
    let config = SpeechConfig::builder().build().unwrap();
    let ctl = Arc::new(PipelineController::with_backends(config, extractor, EchoSynth::new()));
    assert_ok!(ctl.select_file(pdf("a.pdf")));

    let running = {
        let ctl = ctl.clone();
        tokio::spawn(async move { ctl.extract().await })
    };
    wait_until_busy(&ctl).await;

    ctl.reset();
    gate.notify_one();
    assert!(matches!(
        running.await.unwrap(),
        Err(Pdf2SpeechError::Superseded { page: None })
    ));
    assert_eq!(ctl.step(), Step::Upload);
    assert!(ctl.document().is_none());
    assert!(ctl.pages().is_empty());
    assert!(!ctl.is_processing());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn extract_racing_synthesis_never_leaves_session_busy() {
    let ctl = Arc::new(in_review(&["um", "dois"], EchoSynth::new()).await);

    for _ in 0..500 {
        let extracting = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.extract().await })
        };
        let synthesizing = {
            let ctl = ctl.clone();
            tokio::spawn(async move { ctl.synthesize_page(1).await })
        };
        let (extracted, synthesized) = (extracting.await.unwrap(), synthesizing.await.unwrap());

        assert!(
            matches!(extracted, Ok(2) | Err(Pdf2SpeechError::Busy { .. })),
            "extract: {extracted:?}"
        );
        assert!(
            matches!(synthesized, Ok(_) | Err(Pdf2SpeechError::Busy { .. })),
            "synthesize: {synthesized:?}"
        );
        assert!(!ctl.is_processing(), "session left busy: {:?}", ctl.snapshot());
    }

    assert_ok!(ctl.synthesize_page(1).await);
}

// ── One-shot conversion ──────────────────────────────────────────────────────

#[tokio::test]
async fn convert_to_dir_writes_one_file_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Meu Livro.pdf");
    std::fs::write(&input, b"%PDF-1.7\n").unwrap();
    let out = dir.path().join("audio");

    let config = SpeechConfig::builder()
        .extractor(FixedPages::new(&["um", "", "três"]))
        .synthesizer(EchoSynth::new())
        .build()
        .unwrap();

    let summary = convert_to_dir(&input, &out, &config).await.unwrap();
    let names: Vec<String> = summary
        .files
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(names, vec!["Meu_Livro_page_001.mp3", "Meu_Livro_page_003.mp3"]);
    assert_eq!(summary.stats.converted_pages, 2);
    assert_eq!(summary.stats.skipped_pages, 1);
    assert_eq!(std::fs::read(out.join("Meu_Livro_page_003.mp3")).unwrap(), "audio:três".as_bytes());
}

#[tokio::test]
async fn convert_to_dir_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("Relatório Final.pdf");
    std::fs::write(&input, b"%PDF-1.7\n").unwrap();

    let config = SpeechConfig::builder()
        .extractor(FixedPages::new(&["um", "dois"]))
        .synthesizer(EchoSynth::new())
        .whole_document(true)
        .build()
        .unwrap();

    let summary = convert_to_dir(&input, dir.path(), &config).await.unwrap();
    assert_eq!(summary.files, vec![dir.path().join("Relatório_Final.mp3")]);
}
