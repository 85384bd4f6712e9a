//! Speech-to-text adapter

use secrecy::{ExposeSecret, SecretString};

use crate::config::SttConfig;
use crate::voice::capture::{samples_to_wav, SAMPLE_RATE};
use crate::voice::recorder::Utterance;
use crate::{Error, Result};

/// Default transcription endpoint base
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Response from the Whisper transcription API
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes captured audio buffers to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    api_base: String,
    model: String,
    language: String,
}

impl SpeechToText {
    /// Create a new transcription adapter
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is empty.
    pub fn new(api_key: SecretString, stt: &SttConfig) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for transcription".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model: stt.model.clone(),
            language: stt.language.clone(),
        })
    }

    /// Override the API base URL (for OpenAI-compatible backends)
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Transcribe one captured utterance.
    ///
    /// A silence-only utterance short-circuits to an empty string without
    /// touching the backend, and backend failures are reported and
    /// downgraded to an empty string so a cycle can be abandoned cleanly.
    pub async fn transcribe_utterance(&self, utterance: &Utterance) -> String {
        if !utterance.has_speech || utterance.samples.is_empty() {
            tracing::debug!("no speech in utterance, skipping transcription");
            return String::new();
        }

        let wav = match samples_to_wav(&utterance.samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode utterance");
                return String::new();
            }
        };

        match self.transcribe(wav).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "transcription failed");
                String::new()
            }
        }
    }

    /// Transcribe WAV audio bytes to text
    ///
    /// # Errors
    ///
    /// Returns `Error::Stt` on a non-success status and `Error::Http` on
    /// transport failures.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting transcription");

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", self.model.clone())
            .text("language", self.language.clone());

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.api_base))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Stt(format!("transcription API error {status}: {body}")));
        }

        let result: TranscriptionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse transcription response");
            e
        })?;

        let text = result.text.trim().to_string();
        tracing::info!(transcript = %text, "transcription complete");
        Ok(text)
    }
}
