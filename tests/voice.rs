//! Integration tests for the voice pipeline
//!
//! Exercises the device-free pieces: the silence-detecting recorder, WAV
//! encoding, and the transcription adapter's no-speech short circuit.
//! Nothing here touches real audio hardware or the network.

mod common;

use parley::config::SttConfig;
use parley::voice::{
    rms_energy, samples_to_wav, RecorderSettings, SpeechToText, StopReason, UtteranceRecorder,
    SAMPLE_RATE,
};
use secrecy::SecretString;

use common::{silence, sine};

fn settings(timeout_secs: f32, silence_duration_secs: f32) -> RecorderSettings {
    RecorderSettings {
        sample_rate: SAMPLE_RATE,
        timeout_secs,
        silence_duration_secs,
        energy_threshold: 0.015,
    }
}

#[test]
fn sine_wave_counts_as_speech() {
    let samples = sine(440.0, 0.3, 0.5);
    // RMS of a 0.3 amplitude sine is ~0.21, well above the threshold
    assert!(rms_energy(&samples) > 0.015);
}

#[test]
fn quiet_hum_counts_as_silence() {
    let samples = sine(60.0, 0.005, 0.5);
    assert!(rms_energy(&samples) < 0.015);
}

#[test]
fn utterance_ends_after_trailing_silence() {
    let mut recorder = UtteranceRecorder::new(settings(10.0, 1.5));

    assert_eq!(recorder.push(&sine(440.0, 0.3, 2.0)), None);
    let reason = recorder.push(&silence(3.0));
    assert_eq!(reason, Some(StopReason::Silence));

    let utterance = recorder.finish();
    assert!(utterance.has_speech);
    // 2s of speech plus ~1.5s trailing silence
    assert!(utterance.duration_secs() >= 3.4);
    assert!(utterance.duration_secs() <= 4.0);
}

#[test]
fn silence_only_input_ends_at_silence_duration() {
    let mut recorder = UtteranceRecorder::new(settings(10.0, 1.5));

    let reason = recorder.push(&silence(5.0));
    assert_eq!(reason, Some(StopReason::Silence));

    let utterance = recorder.finish();
    assert!(!utterance.has_speech);
    assert!(utterance.duration_secs() < 2.1);
}

#[test]
fn nonstop_speech_ends_at_the_ceiling() {
    let mut recorder = UtteranceRecorder::new(settings(3.0, 1.5));

    let reason = recorder.push(&sine(440.0, 0.3, 6.0));
    assert_eq!(reason, Some(StopReason::Timeout));

    let utterance = recorder.finish();
    assert!(utterance.has_speech);
    // The buffer is clamped to exactly the ceiling
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ceiling = (SAMPLE_RATE as f32 * 3.0) as usize;
    assert_eq!(utterance.samples.len(), ceiling);
}

#[test]
fn wav_encoding_produces_valid_mono_pcm() {
    let samples = sine(440.0, 0.3, 0.25);
    let wav = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Standard 44-byte PCM header plus two bytes per sample
    assert_eq!(wav.len(), 44 + samples.len() * 2);
    assert_eq!(&wav[0..4], b"RIFF");
    assert_eq!(&wav[8..12], b"WAVE");

    let channels = u16::from_le_bytes([wav[22], wav[23]]);
    assert_eq!(channels, 1);

    let rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
    assert_eq!(rate, SAMPLE_RATE);

    let bits = u16::from_le_bytes([wav[34], wav[35]]);
    assert_eq!(bits, 16);
}

#[test]
fn wav_encoding_clamps_out_of_range_samples() {
    let wav = samples_to_wav(&[2.0, -2.0], SAMPLE_RATE).unwrap();

    let first = i16::from_le_bytes([wav[44], wav[45]]);
    let second = i16::from_le_bytes([wav[46], wav[47]]);
    assert_eq!(first, i16::MAX);
    assert_eq!(second, i16::MIN);
}

#[tokio::test]
async fn no_speech_utterance_skips_transcription_backend() {
    let mut recorder = UtteranceRecorder::new(settings(10.0, 0.5));
    recorder.push(&silence(1.0));
    let utterance = recorder.finish();
    assert!(!utterance.has_speech);

    // Unreachable base: a network attempt would hang or error, not return ""
    let stt = SpeechToText::new(
        SecretString::from("sk-test"),
        &SttConfig {
            model: "whisper-1".to_string(),
            language: "en".to_string(),
        },
    )
    .unwrap()
    .with_api_base("http://127.0.0.1:9");

    let text = stt.transcribe_utterance(&utterance).await;
    assert!(text.is_empty());
}

#[tokio::test]
async fn unreachable_transcription_backend_degrades_to_empty() {
    let mut recorder = UtteranceRecorder::new(settings(10.0, 0.5));
    recorder.push(&sine(440.0, 0.3, 1.0));
    recorder.push(&silence(1.0));
    let utterance = recorder.finish();
    assert!(utterance.has_speech);

    let stt = SpeechToText::new(
        SecretString::from("sk-test"),
        &SttConfig {
            model: "whisper-1".to_string(),
            language: "en".to_string(),
        },
    )
    .unwrap()
    .with_api_base("http://127.0.0.1:9");

    // The failure is reported and downgraded, never propagated
    let text = stt.transcribe_utterance(&utterance).await;
    assert!(text.is_empty());
}

#[test]
fn empty_api_key_is_rejected() {
    let result = SpeechToText::new(
        SecretString::from(""),
        &SttConfig {
            model: "whisper-1".to_string(),
            language: "en".to_string(),
        },
    );
    assert!(result.is_err());
}
