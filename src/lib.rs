//! Parley - a hands-free voice assistant loop
//!
//! Wires four external services into a sequential interaction cycle:
//! a local wake word classifier, a hosted speech-to-text backend, a
//! hosted chat-completion backend, and speech synthesis with local
//! playback.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     Microphone                        │
//! └────────────────────┬─────────────────────────────────┘
//!                      │ frames
//! ┌────────────────────▼─────────────────────────────────┐
//! │                    Assistant                          │
//! │  Wake Word │ Recorder │ STT │ Chat │ TTS │ Playback  │
//! └────────────────────┬─────────────────────────────────┘
//!                      │ audio
//! ┌────────────────────▼─────────────────────────────────┐
//! │                     Speakers                          │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The cycle is strictly sequential: waiting, capturing, transcribing,
//! generating, speaking, then back to waiting. One capture stream is
//! owned by the assistant so at most one component reads the microphone
//! at a time.

pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod voice;

pub use assistant::Assistant;
pub use chat::{ChatClient, ChatMessage, Role};
pub use config::Config;
pub use error::{Error, Result};
