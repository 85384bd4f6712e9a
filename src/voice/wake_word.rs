//! Wake word detection
//!
//! Wraps the rustpotter keyword classifier behind a frame-at-a-time
//! polling interface. The classifier is opaque: frames go in, a boolean
//! trigger comes out. Model loading happens once at startup and a failure
//! there is fatal for the whole process.

use rustpotter::{Rustpotter, RustpotterConfig, SampleFormat};

use crate::config::WakeConfig;
use crate::voice::capture::SAMPLE_RATE;
use crate::{Error, Result};

/// Detects the configured wake word in a microphone frame stream
pub struct WakeWordDetector {
    detector: Rustpotter,
    pending: Vec<f32>,
    frame_size: usize,
}

impl WakeWordDetector {
    /// Load the keyword model and build the classifier.
    ///
    /// Sensitivity is in [0.0, 1.0] with higher values more permissive;
    /// it maps inversely onto the classifier's score threshold.
    ///
    /// # Errors
    ///
    /// Returns `Error::WakeWord` if the classifier rejects the
    /// configuration or the model file cannot be loaded.
    pub fn new(wake: &WakeConfig) -> Result<Self> {
        let mut config = RustpotterConfig::default();
        config.fmt.sample_rate = SAMPLE_RATE as usize;
        config.fmt.channels = 1;
        config.fmt.sample_format = SampleFormat::F32;
        config.detector.threshold = (1.0 - wake.sensitivity).clamp(0.0, 1.0);

        let mut detector =
            Rustpotter::new(&config).map_err(|e| Error::WakeWord(e.to_string()))?;
        detector
            .add_wakeword_from_file("wake", &wake.model_path.to_string_lossy())
            .map_err(|e| Error::WakeWord(e.to_string()))?;

        let frame_size = detector.get_samples_per_frame();

        tracing::debug!(
            model = %wake.model_path.display(),
            sensitivity = wake.sensitivity,
            frame_size,
            "wake word detector initialized"
        );

        Ok(Self {
            detector,
            pending: Vec::with_capacity(frame_size),
            frame_size,
        })
    }

    /// Feed captured samples and report whether the wake word triggered.
    ///
    /// Input is buffered internally and handed to the classifier in its
    /// native frame size; leftover samples carry over to the next poll.
    pub fn poll(&mut self, samples: &[f32]) -> bool {
        self.pending.extend_from_slice(samples);

        while self.pending.len() >= self.frame_size {
            let frame: Vec<f32> = self.pending.drain(..self.frame_size).collect();
            if let Some(detection) = self.detector.process_samples(frame) {
                tracing::info!(
                    name = %detection.name,
                    score = detection.score,
                    "wake word detected"
                );
                self.pending.clear();
                return true;
            }
        }

        false
    }

    /// Samples the classifier consumes per frame
    #[must_use]
    pub const fn samples_per_frame(&self) -> usize {
        self.frame_size
    }

    /// Discard buffered samples between listening sessions
    pub fn reset(&mut self) {
        self.pending.clear();
    }
}
