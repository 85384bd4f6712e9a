//! Voice processing module
//!
//! Audio capture, silence-detected recording, wake word detection,
//! transcription, synthesis, and playback.

mod capture;
mod playback;
mod recorder;
mod stt;
mod tts;
mod wake_word;

pub use capture::{samples_to_wav, AudioCapture, SAMPLE_RATE};
pub use playback::AudioPlayback;
pub use recorder::{
    record_utterance, rms_energy, RecorderSettings, StopReason, Utterance, UtteranceRecorder,
};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use wake_word::WakeWordDetector;
