//! Speech synthesis: submit text to a remote text-to-speech service.
//!
//! The shipped backend talks to the Google Cloud Text-to-Speech REST API:
//! one `POST` per call, the API key in the `key` query parameter, and a JSON
//! response whose `audioContent` field carries base64-encoded audio.
//!
//! ## No retry loop
//!
//! A failed call is reported once and not retried here. The controller
//! isolates the failure to its page; the caller decides whether to try
//! again. The only hardening is an explicit per-request timeout.

use crate::config::{
    AudioEncoding, AudioParams, SpeechConfig, SynthesisOptions, VoiceParams,
};
use crate::error::{Pdf2SpeechError, SynthesisError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Synthesized audio for one piece of text.
#[derive(Clone, PartialEq)]
pub struct AudioClip {
    /// Decoded audio bytes.
    pub bytes: Vec<u8>,
    /// Encoding the bytes are in.
    pub encoding: AudioEncoding,
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Turns text into audio.
///
/// Implementations receive text that has already been cut to the configured
/// maximum length and must not split it into several requests.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError>;
}

// ── Truncation ───────────────────────────────────────────────────────────

/// Record of text that was cut before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    pub original_chars: usize,
    pub submitted_chars: usize,
}

/// Text ready for submission plus a note if it was shortened.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedText<'a> {
    pub text: Cow<'a, str>,
    pub truncation: Option<Truncation>,
}

/// Cut `text` to at most `max_chars` characters.
///
/// Trailing content past the limit is dropped; the drop is logged and
/// reported through [`PreparedText::truncation`].
pub fn prepare_text(text: &str, max_chars: usize) -> PreparedText<'_> {
    match text.char_indices().nth(max_chars) {
        None => PreparedText {
            text: Cow::Borrowed(text),
            truncation: None,
        },
        Some((cut, _)) => {
            let original_chars = text.chars().count();
            warn!(
                "Text truncated from {} to {} characters",
                original_chars, max_chars
            );
            PreparedText {
                text: Cow::Borrowed(&text[..cut]),
                truncation: Some(Truncation {
                    original_chars,
                    submitted_chars: max_chars,
                }),
            }
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

/// JSON body of a `text:synthesize` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeRequest<'a> {
    pub input: SynthesisInput<'a>,
    pub voice: VoiceParams,
    pub audio_config: AudioParams,
}

#[derive(Debug, Serialize)]
pub struct SynthesisInput<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: Option<String>,
}

/// Build a request body with `options` merged onto the defaults.
pub fn build_request<'a>(
    text: &'a str,
    voice: &VoiceParams,
    audio: &AudioParams,
    options: &SynthesisOptions,
) -> SynthesizeRequest<'a> {
    SynthesizeRequest {
        input: SynthesisInput { text },
        voice: voice.merged(&options.voice),
        audio_config: audio.merged(&options.audio),
    }
}

/// Decode the `audioContent` field of a response body.
fn decode_response(body: &[u8]) -> Result<Vec<u8>, SynthesisError> {
    let parsed: SynthesizeResponse =
        serde_json::from_slice(body).map_err(|e| SynthesisError::Decode(e.to_string()))?;
    let content = parsed
        .audio_content
        .filter(|c| !c.is_empty())
        .ok_or(SynthesisError::MissingAudio)?;
    STANDARD
        .decode(content.as_bytes())
        .map_err(|e| SynthesisError::Decode(e.to_string()))
}

// ── Google Cloud TTS backend ─────────────────────────────────────────────

/// [`SpeechSynthesizer`] for the Google Cloud Text-to-Speech REST API.
#[derive(Clone)]
pub struct GoogleTtsSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    voice: VoiceParams,
    audio: AudioParams,
    max_text_chars: usize,
    timeout_secs: u64,
}

impl fmt::Debug for GoogleTtsSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTtsSynthesizer")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("voice", &self.voice)
            .field("audio", &self.audio)
            .field("max_text_chars", &self.max_text_chars)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GoogleTtsSynthesizer {
    /// Build from config. The credential comes from `config.api_key` or
    /// the `GOOGLE_TTS_API_KEY` environment variable.
    pub fn from_config(config: &SpeechConfig) -> Result<Self, Pdf2SpeechError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(Pdf2SpeechError::CredentialMissing)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| Pdf2SpeechError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            voice: config.voice.clone(),
            audio: config.audio.clone(),
            max_text_chars: config.max_text_chars,
            timeout_secs: config.api_timeout_secs,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> SynthesisError {
        if e.is_timeout() {
            SynthesisError::Timeout {
                secs: self.timeout_secs,
            }
        } else if e.is_builder() {
            SynthesisError::Request(e.without_url().to_string())
        } else {
            // Strip the URL: it carries the API key.
            SynthesisError::Network(e.without_url().to_string())
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<AudioClip, SynthesisError> {
        let start = Instant::now();
        let prepared = prepare_text(text, self.max_text_chars);
        let body = build_request(&prepared.text, &self.voice, &self.audio, options);
        let encoding = body.audio_config.audio_encoding;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let body: String = String::from_utf8_lossy(&bytes).chars().take(500).collect();
            warn!("Synthesis request failed: HTTP {}", status.as_u16());
            return Err(SynthesisError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let audio = decode_response(&bytes)?;
        debug!(
            "Synthesized {} chars → {} audio bytes in {:?}",
            prepared.text.chars().count(),
            audio.len(),
            start.elapsed()
        );

        Ok(AudioClip {
            bytes: audio,
            encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioOverride, SsmlGender, VoiceOverride};

    #[test]
    fn short_text_is_untouched() {
        let p = prepare_text("olá", 4800);
        assert_eq!(p.text, "olá");
        assert!(p.truncation.is_none());
        assert!(matches!(p.text, Cow::Borrowed(_)));
    }

    #[test]
    fn long_text_cut_to_exact_limit() {
        let text = "a".repeat(6000);
        let p = prepare_text(&text, 4800);
        assert_eq!(p.text.chars().count(), 4800);
        assert_eq!(
            p.truncation,
            Some(Truncation {
                original_chars: 6000,
                submitted_chars: 4800
            })
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "ção".repeat(10);
        let p = prepare_text(&text, 4);
        assert_eq!(p.text, "çãoç");
    }

    #[test]
    fn exactly_at_limit_is_not_truncated() {
        let text = "x".repeat(4800);
        assert!(prepare_text(&text, 4800).truncation.is_none());
    }

    #[test]
    fn request_body_shape() {
        let opts = SynthesisOptions {
            voice: VoiceOverride {
                ssml_gender: Some(SsmlGender::Female),
                ..Default::default()
            },
            audio: AudioOverride {
                pitch: Some(-2.0),
                ..Default::default()
            },
        };
        let req = build_request("oi", &VoiceParams::default(), &AudioParams::default(), &opts);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["input"]["text"], "oi");
        assert_eq!(v["voice"]["languageCode"], "pt-BR");
        assert_eq!(v["voice"]["ssmlGender"], "FEMALE");
        assert_eq!(v["audioConfig"]["audioEncoding"], "MP3");
        assert_eq!(v["audioConfig"]["speakingRate"], 1.0);
        assert_eq!(v["audioConfig"]["pitch"], -2.0);
    }

    #[test]
    fn decode_valid_payload() {
        let body = format!(r#"{{"audioContent":"{}"}}"#, STANDARD.encode(b"ID3fake"));
        assert_eq!(decode_response(body.as_bytes()).unwrap(), b"ID3fake");
    }

    #[test]
    fn decode_missing_payload() {
        assert_eq!(decode_response(b"{}"), Err(SynthesisError::MissingAudio));
        assert_eq!(
            decode_response(br#"{"audioContent":""}"#),
            Err(SynthesisError::MissingAudio)
        );
    }

    #[test]
    fn decode_garbage() {
        assert!(matches!(
            decode_response(b"not json"),
            Err(SynthesisError::Decode(_))
        ));
        assert!(matches!(
            decode_response(br#"{"audioContent":"***"}"#),
            Err(SynthesisError::Decode(_))
        ));
    }

    #[test]
    fn from_config_without_key_fails() {
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }
        let err = GoogleTtsSynthesizer::from_config(&SpeechConfig::default()).unwrap_err();
        assert!(matches!(err, Pdf2SpeechError::CredentialMissing));
    }

    #[test]
    fn debug_hides_key() {
        let config = SpeechConfig::builder().api_key("k-123").build().unwrap();
        let s = GoogleTtsSynthesizer::from_config(&config).unwrap();
        assert!(!format!("{s:?}").contains("k-123"));
    }
}
