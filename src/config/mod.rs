//! Configuration management for the assistant
//!
//! All options are resolved once at startup (env > toml file > default)
//! into an immutable [`Config`] that is passed explicitly to every
//! component constructor. Nothing reads ambient state after load.

pub mod file;

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Default system prompt, tuned for spoken replies
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful voice assistant. Provide concise, natural \
     responses suitable for spoken conversation. Keep answers under 3 sentences unless more \
     detail is specifically requested.";

/// Assistant configuration, immutable after load
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat/transcription/synthesis backend
    pub openai_api_key: SecretString,

    /// Wake word configuration
    pub wake: WakeConfig,

    /// Microphone recording configuration
    pub recording: RecordingConfig,

    /// Speech-to-text configuration
    pub stt: SttConfig,

    /// Chat completion configuration
    pub chat: ChatConfig,

    /// Speech output configuration
    pub tts: TtsConfig,

    /// Speak a short acknowledgement after the wake word triggers
    pub audio_feedback: bool,
}

/// Wake word configuration
#[derive(Debug, Clone)]
pub struct WakeConfig {
    /// Path to the keyword model file
    pub model_path: PathBuf,

    /// Detection sensitivity in [0.0, 1.0] (higher = more permissive)
    pub sensitivity: f32,
}

/// Microphone recording configuration
#[derive(Debug, Clone, Copy)]
pub struct RecordingConfig {
    /// Hard ceiling on recording length in seconds
    pub timeout_secs: f32,

    /// Contiguous trailing silence required to stop early, in seconds
    pub silence_duration_secs: f32,

    /// Per-frame RMS energy below which a frame counts as silence
    pub silence_threshold: f32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Transcription model identifier
    pub model: String,

    /// ISO 639-1 language code
    pub language: String,
}

/// Chat completion configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Model identifier
    pub model: String,

    /// Maximum tokens in a response
    pub max_tokens: u32,

    /// Response randomness, 0.0 to 2.0
    pub temperature: f32,

    /// System message controlling assistant behavior
    pub system_prompt: String,

    /// Maximum user/assistant entries kept in context
    pub max_history: usize,
}

/// Speech output configuration
#[derive(Debug, Clone, Copy)]
pub struct TtsConfig {
    /// Speech rate in words per minute
    pub speech_rate_wpm: u32,

    /// Voice selection index into the backend's voice table
    pub voice_index: usize,
}

impl Config {
    /// Load configuration from environment and optional TOML file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key is missing or the wake word
    /// model file does not exist. Both are fatal at startup.
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .or(fc.api_keys.openai)
            .map(SecretString::from)
            .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))?;

        let wake = WakeConfig {
            model_path: std::env::var("PARLEY_WAKE_MODEL")
                .ok()
                .or(fc.wake.model_path)
                .map(PathBuf::from)
                .ok_or_else(|| {
                    Error::Config("wake word model path not set (PARLEY_WAKE_MODEL)".to_string())
                })?,
            sensitivity: env_parse("PARLEY_WAKE_SENSITIVITY")
                .or(fc.wake.sensitivity)
                .unwrap_or(0.5),
        };

        let recording = RecordingConfig {
            timeout_secs: env_parse("PARLEY_RECORDING_TIMEOUT")
                .or(fc.recording.timeout_secs)
                .unwrap_or(10.0),
            silence_duration_secs: env_parse("PARLEY_SILENCE_DURATION")
                .or(fc.recording.silence_duration_secs)
                .unwrap_or(1.5),
            silence_threshold: env_parse("PARLEY_SILENCE_THRESHOLD")
                .or(fc.recording.silence_threshold)
                .unwrap_or(0.015),
        };

        let stt = SttConfig {
            model: std::env::var("PARLEY_STT_MODEL")
                .ok()
                .or(fc.stt.model)
                .unwrap_or_else(|| "whisper-1".to_string()),
            language: std::env::var("PARLEY_LANGUAGE")
                .ok()
                .or(fc.stt.language)
                .unwrap_or_else(|| "en".to_string()),
        };

        let chat = ChatConfig {
            model: std::env::var("PARLEY_CHAT_MODEL")
                .ok()
                .or(fc.chat.model)
                .unwrap_or_else(|| "gpt-4o".to_string()),
            max_tokens: env_parse("PARLEY_MAX_TOKENS")
                .or(fc.chat.max_tokens)
                .unwrap_or(500),
            temperature: env_parse("PARLEY_TEMPERATURE")
                .or(fc.chat.temperature)
                .unwrap_or(0.7),
            system_prompt: std::env::var("PARLEY_SYSTEM_PROMPT")
                .ok()
                .or(fc.chat.system_prompt)
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_history: env_parse("PARLEY_MAX_HISTORY")
                .or(fc.chat.max_history)
                .unwrap_or(10),
        };

        let tts = TtsConfig {
            speech_rate_wpm: env_parse("PARLEY_SPEECH_RATE")
                .or(fc.tts.speech_rate_wpm)
                .unwrap_or(175),
            voice_index: env_parse("PARLEY_VOICE_INDEX")
                .or(fc.tts.voice_index)
                .unwrap_or(1),
        };

        let audio_feedback = env_parse("PARLEY_AUDIO_FEEDBACK")
            .or(fc.assistant.audio_feedback)
            .unwrap_or(true);

        let config = Self {
            openai_api_key,
            wake,
            recording,
            stt,
            chat,
            tts,
            audio_feedback,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate startup requirements
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a missing wake model file, an empty API
    /// key, or out-of-range numeric options.
    pub fn validate(&self) -> Result<()> {
        if self.openai_api_key.expose_secret().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY is empty".to_string()));
        }

        if !self.wake.model_path.exists() {
            return Err(Error::Config(format!(
                "wake word model not found: {}",
                self.wake.model_path.display()
            )));
        }

        if !(0.0..=1.0).contains(&self.wake.sensitivity) {
            return Err(Error::Config(format!(
                "wake sensitivity must be in [0.0, 1.0], got {}",
                self.wake.sensitivity
            )));
        }

        if self.recording.timeout_secs <= 0.0 || self.recording.silence_duration_secs <= 0.0 {
            return Err(Error::Config(
                "recording timeout and silence duration must be positive".to_string(),
            ));
        }

        if self.chat.max_history == 0 {
            return Err(Error::Config("max_history must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Parse an environment variable, warning (not failing) on bad values
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "unparseable value, ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            openai_api_key: SecretString::from("sk-test"),
            wake: WakeConfig {
                model_path: PathBuf::from("/dev/null"),
                sensitivity: 0.5,
            },
            recording: RecordingConfig {
                timeout_secs: 10.0,
                silence_duration_secs: 1.5,
                silence_threshold: 0.015,
            },
            stt: SttConfig {
                model: "whisper-1".to_string(),
                language: "en".to_string(),
            },
            chat: ChatConfig {
                model: "gpt-4o".to_string(),
                max_tokens: 500,
                temperature: 0.7,
                system_prompt: "test".to_string(),
                max_history: 10,
            },
            tts: TtsConfig {
                speech_rate_wpm: 175,
                voice_index: 1,
            },
            audio_feedback: true,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn missing_wake_model_is_fatal() {
        let mut config = test_config();
        config.wake.model_path = PathBuf::from("/nonexistent/model.rpw");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn empty_api_key_is_fatal() {
        let mut config = test_config();
        config.openai_api_key = SecretString::from("");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn out_of_range_sensitivity_is_fatal() {
        let mut config = test_config();
        config.wake.sensitivity = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn zero_history_is_fatal() {
        let mut config = test_config();
        config.chat.max_history = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
