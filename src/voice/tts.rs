//! Text-to-speech adapter

use secrecy::{ExposeSecret, SecretString};

use crate::config::TtsConfig;
use crate::{Error, Result};

/// Default synthesis endpoint base
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Named voices offered by the backend, selectable by index
const VOICES: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Baseline speaking rate the speed multiplier is relative to
const BASELINE_WPM: f32 = 175.0;

/// Synthesizes speech audio from reply text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    voice: String,
    speed: f32,
}

impl TextToSpeech {
    /// Create a new synthesis adapter.
    ///
    /// The configured words-per-minute rate maps onto the backend's speed
    /// multiplier, and the voice index selects from the backend's named
    /// voice table (wrapping past the end).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty.
    pub fn new(api_key: SecretString, tts: TtsConfig) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for speech synthesis".to_string()));
        }

        let voice = VOICES[tts.voice_index % VOICES.len()].to_string();
        #[allow(clippy::cast_precision_loss)]
        let speed = (tts.speech_rate_wpm as f32 / BASELINE_WPM).clamp(0.25, 4.0);

        tracing::debug!(voice = %voice, speed, "speech synthesis initialized");

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            voice,
            speed,
        })
    }

    /// Override the API base URL (for OpenAI-compatible backends)
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Synthesize text to MP3 audio bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Tts` for empty input or a non-success status, and
    /// `Error::Http` on transport failures.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        if text.trim().is_empty() {
            return Err(Error::Tts("empty text".to_string()));
        }

        let request = SpeechRequest {
            model: "tts-1",
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.api_base))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("speech API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
