//! Pipeline stages for PDF-to-speech conversion.
//!
//! Each submodule implements exactly one transformation step behind a
//! trait, so the controller can be driven by the real backends in
//! production and by in-memory fakes in tests.
//!
//! ## Data Flow
//!
//! ```text
//! Document ──▶ extract ──▶ PageRecord[] ──▶ synthesize ──▶ AudioClip
//!  (bytes)     (pdfium)     (1..=N text)     (TTS REST)     (audio bytes)
//! ```
//!
//! 1. [`extract`]   : open the PDF and pull plain text per page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 2. [`synthesize`]: truncate, submit to the speech service, decode the
//!    base64 payload; the only stage with network I/O

pub mod extract;
pub mod synthesize;
