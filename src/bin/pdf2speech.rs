//! CLI binary for edgequake-pdf2speech.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SpeechConfig` and writes one audio file per page.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2speech::{
    convert_to_dir, inspect, AudioEncoding, Notice, NoticeLevel, PageSelection, PipelineObserver,
    SharedObserver, SpeechConfig, SsmlGender,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a live progress bar plus one log line per page.
struct CliObserver {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Speaking");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&page_num)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl PipelineObserver for CliObserver {
    fn on_notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => self.bar.set_message(notice.message.clone()),
            NoticeLevel::Warning => self
                .bar
                .println(format!("  {} {}", yellow("!"), yellow(&notice.message))),
            // Success is summarised at the end; errors come back through anyhow.
            NoticeLevel::Success | NoticeLevel::Error => {}
        }
    }

    fn on_batch_start(&self, total: usize) {
        self.activate_bar(total);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Synthesizing {total} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.start_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(page_num, Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, _total: usize, audio_bytes: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}  {:<12}  {}",
            green("✓"),
            page_num,
            dim(&format!("{:>6} KiB", audio_bytes / 1024)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, _total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}  {}  {}",
            red("✗"),
            page_num,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {} of {} pages converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page, one MP3 per page, into the current directory
  pdf2speech book.pdf

  # Pages 3 to 15 in English, female voice, into ./audio
  pdf2speech --pages 3-15 --language en-US --gender female book.pdf -o audio

  # One file for the whole document
  pdf2speech --whole-document book.pdf

  # Slower, lower, named voice
  pdf2speech --voice pt-BR-Wavenet-B --rate 0.85 --pitch -2 book.pdf

  # Per-page character counts (no API key needed)
  pdf2speech --inspect-only book.pdf

  # JSON summary of written files
  pdf2speech --json book.pdf > result.json

LIMITS:
  PDF files up to 10 MiB. Each request carries at most 4800 characters;
  longer pages are cut and a warning is printed.

ENVIRONMENT VARIABLES:
  GOOGLE_TTS_API_KEY      Google Cloud Text-to-Speech API key
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise the system library is used)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Turn PDF files into spoken audio.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2speech",
    version,
    about = "Turn PDF files into spoken audio, page by page",
    long_about = "Extract the text of each page of a PDF and read it aloud with the Google \
Cloud Text-to-Speech API. Writes one audio file per page, or a single file for the whole \
document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file path.
    input: PathBuf,

    /// Directory the audio files are written to.
    #[arg(short, long, env = "PDF2SPEECH_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2SPEECH_PAGES", default_value = "all")]
    pages: String,

    /// Synthesize all text as one request into a single file.
    #[arg(long, env = "PDF2SPEECH_WHOLE_DOCUMENT")]
    whole_document: bool,

    /// BCP-47 language code (e.g. pt-BR, en-US).
    #[arg(short, long, env = "PDF2SPEECH_LANGUAGE", default_value = "pt-BR")]
    language: String,

    /// Voice name (e.g. en-US-Neural2-C). Default: chosen by the service.
    #[arg(long, env = "PDF2SPEECH_VOICE")]
    voice: Option<String>,

    /// Voice gender.
    #[arg(long, env = "PDF2SPEECH_GENDER", value_enum, default_value = "neutral")]
    gender: GenderArg,

    /// Audio encoding of the output files.
    #[arg(long, env = "PDF2SPEECH_ENCODING", value_enum, default_value = "mp3")]
    encoding: EncodingArg,

    /// Speaking rate (0.25–4.0).
    #[arg(long, env = "PDF2SPEECH_RATE", default_value_t = 1.0)]
    rate: f64,

    /// Pitch in semitones (-20–20).
    #[arg(long, env = "PDF2SPEECH_PITCH", default_value_t = 0.0, allow_hyphen_values = true)]
    pitch: f64,

    /// Google Cloud Text-to-Speech API key.
    #[arg(long, env = "GOOGLE_TTS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Override the synthesis endpoint URL.
    #[arg(long, env = "PDF2SPEECH_ENDPOINT")]
    endpoint: Option<String>,

    /// Maximum characters sent per request.
    #[arg(long, env = "PDF2SPEECH_MAX_CHARS", default_value_t = 4800)]
    max_chars: usize,

    /// Per-request timeout in seconds.
    #[arg(long, env = "PDF2SPEECH_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Print a JSON summary instead of text.
    #[arg(long, env = "PDF2SPEECH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2SPEECH_NO_PROGRESS")]
    no_progress: bool,

    /// Print per-page character counts only, no synthesis.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2SPEECH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2SPEECH_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum GenderArg {
    Neutral,
    Male,
    Female,
}

impl From<GenderArg> for SsmlGender {
    fn from(v: GenderArg) -> Self {
        match v {
            GenderArg::Neutral => SsmlGender::Neutral,
            GenderArg::Male => SsmlGender::Male,
            GenderArg::Female => SsmlGender::Female,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EncodingArg {
    Mp3,
    Wav,
    Ogg,
}

impl From<EncodingArg> for AudioEncoding {
    fn from(v: EncodingArg) -> Self {
        match v {
            EncodingArg::Mp3 => AudioEncoding::Mp3,
            EncodingArg::Wav => AudioEncoding::Linear16,
            EncodingArg::Ogg => AudioEncoding::OggOpus,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar is the feedback while it is up; keep library logs to
    // errors unless asked for more.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let config = build_config(&cli, None)?;
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize page info")?
            );
        } else {
            println!("File:         {}", info.name);
            println!("Size:         {} bytes", info.size_bytes);
            println!("Pages:        {}", info.page_count);
            for page in &info.pages {
                if page.has_text {
                    println!("  p.{:<4} {:>6} chars", page.page_num, page.chars);
                } else {
                    println!("  p.{:<4} {}", page.page_num, dim("(no text)"));
                }
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliObserver::new);
    let observer = progress
        .as_ref()
        .map(|p| Arc::clone(p) as SharedObserver);
    let config = build_config(&cli, observer)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert_to_dir(&cli.input, &cli.output_dir, &config).await;
    // Whole-document runs never start a batch, so the spinner is still up.
    if let Some(ref p) = progress {
        p.bar.finish_and_clear();
    }
    let summary = result.context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet {
        let stats = &summary.stats;
        if !show_progress && !config.whole_document {
            eprintln!(
                "Converted {} of {} pages in {}ms",
                stats.converted_pages,
                stats.converted_pages + stats.failed_pages,
                stats.total_duration_ms
            );
            if stats.failed_pages > 0 {
                eprintln!("  {} pages failed", stats.failed_pages);
            }
        }
        if stats.skipped_pages > 0 {
            eprintln!("   {}", dim(&format!("{} pages without text skipped", stats.skipped_pages)));
        }
        for file in &summary.files {
            eprintln!("   {} {}", green("→"), bold(&file.display().to_string()));
        }
        eprintln!(
            "   {}",
            dim(&format!(
                "{} KiB audio  /  {}ms total",
                stats.audio_bytes / 1024,
                stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `SpeechConfig`.
fn build_config(cli: &Cli, observer: Option<SharedObserver>) -> Result<SpeechConfig> {
    let mut builder = SpeechConfig::builder()
        .language_code(cli.language.clone())
        .ssml_gender(cli.gender.clone().into())
        .audio_encoding(cli.encoding.clone().into())
        .speaking_rate(cli.rate)
        .pitch(cli.pitch)
        .max_text_chars(cli.max_chars)
        .api_timeout_secs(cli.api_timeout)
        .pages(parse_pages(&cli.pages)?)
        .whole_document(cli.whole_document);

    if let Some(ref voice) = cli.voice {
        builder = builder.voice_name(voice.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if pages.contains(&0) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got 0)");
        }
        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}
