//! TOML configuration file loading
//!
//! Supports `~/.config/parley/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfigFile {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Wake word configuration
    #[serde(default)]
    pub wake: WakeFileConfig,

    /// Microphone recording configuration
    #[serde(default)]
    pub recording: RecordingFileConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Chat completion configuration
    #[serde(default)]
    pub chat: ChatFileConfig,

    /// Speech output configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Assistant behavior toggles
    #[serde(default)]
    pub assistant: AssistantFileConfig,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
}

/// Wake word configuration
#[derive(Debug, Default, Deserialize)]
pub struct WakeFileConfig {
    /// Path to the keyword model file (.rpw)
    pub model_path: Option<String>,

    /// Detection sensitivity, 0.0 to 1.0 (higher = more permissive)
    pub sensitivity: Option<f32>,
}

/// Microphone recording configuration
#[derive(Debug, Default, Deserialize)]
pub struct RecordingFileConfig {
    /// Hard ceiling on recording length in seconds
    pub timeout_secs: Option<f32>,

    /// Trailing silence required to stop early, in seconds
    pub silence_duration_secs: Option<f32>,

    /// Per-frame RMS energy below which a frame counts as silence
    pub silence_threshold: Option<f32>,
}

/// Speech-to-text configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Transcription model identifier (e.g. "whisper-1")
    pub model: Option<String>,

    /// ISO 639-1 language code (e.g. "en")
    pub language: Option<String>,
}

/// Chat completion configuration
#[derive(Debug, Default, Deserialize)]
pub struct ChatFileConfig {
    /// Model identifier (e.g. "gpt-4o")
    pub model: Option<String>,

    /// Maximum tokens in a response
    pub max_tokens: Option<u32>,

    /// Response randomness, 0.0 to 2.0
    pub temperature: Option<f32>,

    /// System message controlling assistant behavior
    pub system_prompt: Option<String>,

    /// Maximum user/assistant entries kept in context
    pub max_history: Option<usize>,
}

/// Speech output configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Speech rate in words per minute
    pub speech_rate_wpm: Option<u32>,

    /// Voice selection index into the backend's voice table
    pub voice_index: Option<usize>,
}

/// Assistant behavior toggles
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Speak a short acknowledgement after the wake word
    pub audio_feedback: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ParleyConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> ParleyConfigFile {
    let Some(path) = config_file_path() else {
        return ParleyConfigFile::default();
    };

    if !path.exists() {
        return ParleyConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ParleyConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ParleyConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/parley/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("parley").join("config.toml"))
}
