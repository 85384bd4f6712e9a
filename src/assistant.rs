//! Orchestrator for the voice interaction loop
//!
//! Runs the steady-state cycle: wait for the wake word, record an
//! utterance, transcribe it, get a chat reply, speak it, and return to
//! waiting. Stages execute strictly sequentially; the single capture
//! stream is owned here so only one component reads the microphone at a
//! time, and wake word polling only happens while waiting.

use std::time::Duration;

use crate::chat::ChatClient;
use crate::config::Config;
use crate::voice::{
    record_utterance, AudioCapture, AudioPlayback, RecorderSettings, SpeechToText, TextToSpeech,
    WakeWordDetector,
};
use crate::Result;

/// Poll cadence for feeding wake word frames while idle
const WAKE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interaction loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitingForWakeWord,
    Capturing,
    Transcribing,
    Generating,
    Speaking,
}

/// The assistant: owns every adapter and drives the interaction cycle
pub struct Assistant {
    config: Config,
    wake: WakeWordDetector,
    capture: AudioCapture,
    playback: AudioPlayback,
    stt: SpeechToText,
    chat: ChatClient,
    tts: TextToSpeech,
    state: State,
}

impl Assistant {
    /// Initialize all components.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal at startup: a missing keyword model, an
    /// unavailable microphone or speaker, or an empty API key.
    pub fn new(config: Config) -> Result<Self> {
        tracing::info!("loading wake word detector");
        let wake = WakeWordDetector::new(&config.wake)?;

        tracing::info!("opening audio devices");
        let capture = AudioCapture::new()?;
        let playback = AudioPlayback::new()?;

        let stt = SpeechToText::new(config.openai_api_key.clone(), &config.stt)?;
        let chat = ChatClient::new(config.openai_api_key.clone(), &config.chat)?;
        let tts = TextToSpeech::new(config.openai_api_key.clone(), config.tts)?;

        tracing::info!("all components initialized");

        Ok(Self {
            config,
            wake,
            capture,
            playback,
            stt,
            chat,
            tts,
            state: State::WaitingForWakeWord,
        })
    }

    /// Run the interaction loop until interrupted.
    ///
    /// Per-cycle failures are reported and the loop returns to waiting;
    /// Ctrl-C stops the capture stream and exits at the next await point.
    ///
    /// # Errors
    ///
    /// Returns an error only if the capture stream cannot be started.
    pub async fn run(&mut self) -> Result<()> {
        self.capture.start()?;

        tracing::info!("assistant ready, say the wake word to begin");
        self.speak("Voice assistant ready.").await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupt received, shutting down");
                    break;
                }
                result = self.interaction_cycle() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "interaction cycle failed");
                    }
                }
            }
        }

        self.capture.stop();
        Ok(())
    }

    /// One full cycle: wake word, capture, transcribe, generate, speak
    async fn interaction_cycle(&mut self) -> Result<()> {
        self.transition(State::WaitingForWakeWord);
        self.wake.reset();
        self.capture.clear_buffer();

        loop {
            tokio::time::sleep(WAKE_POLL_INTERVAL).await;
            let chunk = self.capture.take_buffer();
            if self.wake.poll(&chunk) {
                break;
            }
        }

        if self.config.audio_feedback {
            self.speak("Yes?").await;
        }

        self.transition(State::Capturing);
        let settings = RecorderSettings::from_config(self.config.recording);
        let utterance = record_utterance(&self.capture, settings).await?;

        self.transition(State::Transcribing);
        let user_text = self.stt.transcribe_utterance(&utterance).await;
        if user_text.is_empty() {
            tracing::info!("no speech detected");
            self.speak("I didn't catch that. Please try again.").await;
            return Ok(());
        }
        tracing::info!(user = %user_text, "user utterance");

        self.transition(State::Generating);
        let reply = self.chat.respond(&user_text).await;
        if reply.is_empty() {
            return Ok(());
        }
        tracing::info!(assistant = %reply, "assistant reply");

        self.transition(State::Speaking);
        self.speak(&reply).await;

        Ok(())
    }

    /// Synthesize and play one utterance, reporting but swallowing errors
    async fn speak(&self, text: &str) {
        match self.tts.synthesize(text).await {
            Ok(mp3) => {
                if let Err(e) = self.playback.play_mp3(&mp3) {
                    tracing::error!(error = %e, "playback failed");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "speech synthesis failed");
            }
        }
    }

    fn transition(&mut self, next: State) {
        tracing::debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}
