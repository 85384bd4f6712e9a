//! Utterance recording with energy-based silence detection
//!
//! [`UtteranceRecorder`] is the device-free state machine: it consumes
//! fixed-size frames, tracks per-frame RMS energy and a consecutive-silence
//! counter, and stops on trailing silence or the hard timeout, whichever
//! comes first. [`record_utterance`] drives it from a live [`AudioCapture`]
//! stream at a fixed poll cadence.

use std::time::Duration;

use crate::config::RecordingConfig;
use crate::voice::capture::{AudioCapture, SAMPLE_RATE};
use crate::{Error, Result};

/// Samples per analysis frame (64ms at 16kHz)
const FRAME_SAMPLES: usize = 1024;

/// Poll cadence for draining the capture buffer
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why a capture cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Trailing silence reached the configured duration
    Silence,
    /// The hard recording ceiling elapsed
    Timeout,
}

/// Recorder tuning derived from configuration
#[derive(Debug, Clone, Copy)]
pub struct RecorderSettings {
    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Hard ceiling on recording length in seconds
    pub timeout_secs: f32,

    /// Contiguous trailing silence required to stop early, in seconds
    pub silence_duration_secs: f32,

    /// Per-frame RMS energy below which a frame counts as silence
    pub energy_threshold: f32,
}

impl RecorderSettings {
    /// Build settings from the recording config at the capture sample rate
    #[must_use]
    pub const fn from_config(recording: RecordingConfig) -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            timeout_secs: recording.timeout_secs,
            silence_duration_secs: recording.silence_duration_secs,
            energy_threshold: recording.silence_threshold,
        }
    }
}

/// One captured audio buffer plus how the cycle ended
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Contiguous f32 samples at the capture sample rate
    pub samples: Vec<f32>,

    /// Why recording stopped
    pub stop: StopReason,

    /// Whether any frame exceeded the energy threshold
    pub has_speech: bool,

    sample_rate: u32,
}

impl Utterance {
    /// Duration of the captured audio in seconds
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Accumulates microphone frames until silence or timeout stops the cycle
pub struct UtteranceRecorder {
    samples: Vec<f32>,
    pending: Vec<f32>,
    silence_samples: usize,
    silence_limit: usize,
    max_samples: usize,
    energy_threshold: f32,
    has_speech: bool,
    stopped: Option<StopReason>,
    sample_rate: u32,
}

impl UtteranceRecorder {
    /// Create a recorder for one capture cycle
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn new(settings: RecorderSettings) -> Self {
        let rate = settings.sample_rate as f32;
        // At least one frame each, so degenerate settings still terminate
        let silence_limit = ((settings.silence_duration_secs * rate) as usize).max(FRAME_SAMPLES);
        let max_samples = ((settings.timeout_secs * rate) as usize).max(FRAME_SAMPLES);

        Self {
            samples: Vec::with_capacity(max_samples),
            pending: Vec::with_capacity(FRAME_SAMPLES),
            silence_samples: 0,
            silence_limit,
            max_samples,
            energy_threshold: settings.energy_threshold,
            has_speech: false,
            stopped: None,
            sample_rate: settings.sample_rate,
        }
    }

    /// Feed captured samples, chunked internally into fixed frames.
    ///
    /// Returns the stop reason once the cycle has ended; further input is
    /// ignored after that.
    pub fn push(&mut self, input: &[f32]) -> Option<StopReason> {
        if self.stopped.is_some() {
            return self.stopped;
        }

        self.pending.extend_from_slice(input);
        while self.pending.len() >= FRAME_SAMPLES && self.stopped.is_none() {
            let frame: Vec<f32> = self.pending.drain(..FRAME_SAMPLES).collect();
            self.push_frame(&frame);
        }

        self.stopped
    }

    fn push_frame(&mut self, frame: &[f32]) {
        let energy = rms_energy(frame);
        if energy > self.energy_threshold {
            self.has_speech = true;
            self.silence_samples = 0;
        } else {
            self.silence_samples += frame.len();
        }

        // Clamp so the buffer can never exceed the timeout ceiling
        let room = self.max_samples - self.samples.len();
        self.samples.extend_from_slice(&frame[..frame.len().min(room)]);

        if self.silence_samples >= self.silence_limit {
            tracing::debug!(
                samples = self.samples.len(),
                has_speech = self.has_speech,
                "silence detected, stopping recording"
            );
            self.stopped = Some(StopReason::Silence);
        } else if self.samples.len() >= self.max_samples {
            tracing::debug!(samples = self.samples.len(), "recording timeout reached");
            self.stopped = Some(StopReason::Timeout);
        }
    }

    /// Stop reason, if the cycle has ended
    #[must_use]
    pub const fn stop_reason(&self) -> Option<StopReason> {
        self.stopped
    }

    /// Number of samples accepted so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when no samples have been accepted yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Consume the recorder and return the captured utterance.
    ///
    /// An interrupted cycle that never hit a stop condition reports
    /// `Timeout`, the conservative reason.
    #[must_use]
    pub fn finish(self) -> Utterance {
        Utterance {
            samples: self.samples,
            stop: self.stopped.unwrap_or(StopReason::Timeout),
            has_speech: self.has_speech,
            sample_rate: self.sample_rate,
        }
    }
}

/// Record one utterance from a running capture stream.
///
/// The caller retains ownership of the stream; stale samples are discarded
/// before the cycle starts so the buffer contains only fresh audio.
///
/// # Errors
///
/// Returns `Error::Audio` if the input stream stalls and produces no
/// samples for the whole recording window.
pub async fn record_utterance(
    capture: &AudioCapture,
    settings: RecorderSettings,
) -> Result<Utterance> {
    capture.clear_buffer();

    let mut recorder = UtteranceRecorder::new(settings);
    let deadline =
        std::time::Instant::now() + Duration::from_secs_f32(settings.timeout_secs) + POLL_INTERVAL * 20;

    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let chunk = capture.take_buffer();
        if recorder.push(&chunk).is_some() {
            let utterance = recorder.finish();
            tracing::debug!(
                duration = utterance.duration_secs(),
                stop = ?utterance.stop,
                has_speech = utterance.has_speech,
                "recording complete"
            );
            return Ok(utterance);
        }

        // Wall-clock guard: a stalled device never accumulates enough
        // samples to trip the sample-count timeout
        if std::time::Instant::now() > deadline {
            return Err(Error::Audio("input stream stalled during recording".to_string()));
        }
    }
}

/// RMS energy of a block of samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(timeout: f32, silence: f32) -> RecorderSettings {
        RecorderSettings {
            sample_rate: SAMPLE_RATE,
            timeout_secs: timeout,
            silence_duration_secs: silence,
            energy_threshold: 0.015,
        }
    }

    fn silence_frames(secs: f32) -> Vec<f32> {
        vec![0.0; (SAMPLE_RATE as f32 * secs) as usize]
    }

    fn speech_frames(secs: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * secs) as usize;
        (0..n)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    #[test]
    fn rms_of_silence_is_zero() {
        assert!(rms_energy(&vec![0.0; FRAME_SAMPLES]) < 1e-6);
        assert!(rms_energy(&[]) < 1e-6);
    }

    #[test]
    fn rms_of_constant_signal() {
        let energy = rms_energy(&vec![0.5; FRAME_SAMPLES]);
        assert!((energy - 0.5).abs() < 1e-4);
    }

    #[test]
    fn silence_only_stops_at_silence_duration() {
        let mut recorder = UtteranceRecorder::new(settings(10.0, 1.5));

        // 3 seconds of synthetic silence, pushed in odd-sized chunks
        let reason = recorder.push(&silence_frames(3.0));
        assert_eq!(reason, Some(StopReason::Silence));

        let utterance = recorder.finish();
        assert!(!utterance.has_speech);
        // ~1.5-2s of audio, nowhere near the 10s ceiling
        assert!(utterance.duration_secs() >= 1.4);
        assert!(utterance.duration_secs() <= 2.0);
    }

    #[test]
    fn continuous_speech_stops_exactly_at_timeout() {
        let mut recorder = UtteranceRecorder::new(settings(2.0, 0.5));

        let reason = recorder.push(&speech_frames(5.0));
        assert_eq!(reason, Some(StopReason::Timeout));

        let utterance = recorder.finish();
        assert!(utterance.has_speech);
        // Clamped to exactly the ceiling, never past it
        assert_eq!(utterance.samples.len(), (SAMPLE_RATE as f32 * 2.0) as usize);
    }

    #[test]
    fn speech_then_silence_stops_after_trailing_silence() {
        let mut recorder = UtteranceRecorder::new(settings(10.0, 1.0));

        assert_eq!(recorder.push(&speech_frames(1.0)), None);
        let reason = recorder.push(&silence_frames(2.0));
        assert_eq!(reason, Some(StopReason::Silence));

        let utterance = recorder.finish();
        assert!(utterance.has_speech);
        // 1s speech + ~1s trailing silence
        assert!(utterance.duration_secs() >= 1.9);
        assert!(utterance.duration_secs() <= 2.5);
    }

    #[test]
    fn speech_resets_the_silence_counter() {
        let mut recorder = UtteranceRecorder::new(settings(10.0, 1.0));

        // Alternating short silences never reach the limit
        for _ in 0..5 {
            assert_eq!(recorder.push(&silence_frames(0.5)), None);
            assert_eq!(recorder.push(&speech_frames(0.2)), None);
        }
        assert!(recorder.stop_reason().is_none());
    }

    #[test]
    fn buffer_is_never_empty_on_immediate_silence() {
        let mut recorder = UtteranceRecorder::new(settings(10.0, 0.5));

        recorder.push(&silence_frames(1.0));
        let utterance = recorder.finish();
        assert!(!utterance.samples.is_empty());
        assert!(!utterance.has_speech);
    }

    #[test]
    fn input_after_stop_is_ignored() {
        let mut recorder = UtteranceRecorder::new(settings(10.0, 0.5));

        recorder.push(&silence_frames(1.0));
        let len_at_stop = recorder.len();

        assert_eq!(recorder.push(&speech_frames(1.0)), Some(StopReason::Silence));
        assert_eq!(recorder.len(), len_at_stop);
    }

    #[test]
    fn sub_frame_chunks_accumulate() {
        let mut recorder = UtteranceRecorder::new(settings(10.0, 0.5));

        // Feed silence 100 samples at a time; frames assemble internally
        let chunk = vec![0.0f32; 100];
        let mut stopped = None;
        for _ in 0..200 {
            stopped = recorder.push(&chunk);
            if stopped.is_some() {
                break;
            }
        }
        assert_eq!(stopped, Some(StopReason::Silence));
    }
}
