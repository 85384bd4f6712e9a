use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use parley::chat::ChatClient;
use parley::voice::{
    record_utterance, rms_energy, AudioCapture, AudioPlayback, RecorderSettings, SpeechToText,
    TextToSpeech, WakeWordDetector,
};
use parley::{Assistant, Config};

/// Parley - hands-free voice assistant
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input with a live level meter
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output with a sine tone
    TestSpeaker,
    /// Test wake word detection against live microphone input
    TestWake {
        /// Duration in seconds
        #[arg(short, long, default_value = "15")]
        duration: u64,
    },
    /// Record one utterance with silence detection, then transcribe it
    TestRecord,
    /// Send one message through the conversation adapter
    TestChat {
        /// Message to send
        #[arg(default_value = "Hello, who are you?")]
        message: String,
    },
    /// Synthesize and play one utterance
    TestSpeak {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the speech output system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,parley=info",
        1 => "info,parley=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestWake { duration } => test_wake(duration).await,
            Command::TestRecord => test_record().await,
            Command::TestChat { message } => test_chat(&message).await,
            Command::TestSpeak { text } => test_speak(&text).await,
        };
    }

    println!("Parley voice assistant");
    println!("Say the wake word to activate. Press Ctrl+C to exit.\n");

    let config = Config::load()?;
    let mut assistant = Assistant::new(config)?;
    assistant.run().await?;

    println!("\nGoodbye!");
    Ok(())
}

/// Test microphone input
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.peek_buffer();
        let energy = rms_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );

        capture.clear_buffer();
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working.");
    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    // 2 seconds of 440Hz at the 24kHz playback rate
    let sample_rate = 24000.0_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    playback.play(samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working.");
    Ok(())
}

/// Test wake word detection
async fn test_wake(duration: u64) -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Wake word detection test");
    println!("Model: {}", config.wake.model_path.display());
    println!("Say the wake word within the next {duration} seconds...\n");

    let mut detector = WakeWordDetector::new(&config.wake)?;
    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let mut detections = 0u32;
    for _ in 0..(duration * 10) {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let chunk = capture.take_buffer();
        if detector.poll(&chunk) {
            detections += 1;
            println!("Wake word detected! [{detections}]");
        }
    }

    capture.stop();

    println!("\n---");
    if detections > 0 {
        println!("{detections} detection(s). Wake word is working.");
    } else {
        println!("No detections. Try a higher sensitivity or check the model file.");
    }
    Ok(())
}

/// Record one utterance and transcribe it
async fn test_record() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Recording test - speak after the prompt");
    println!(
        "Stops after {}s of silence, or {}s total\n",
        config.recording.silence_duration_secs, config.recording.timeout_secs
    );
    println!("Speak now...");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let settings = RecorderSettings::from_config(config.recording);
    let utterance = record_utterance(&capture, settings).await?;
    capture.stop();

    println!(
        "\nCaptured {:.1}s of audio (stop: {:?}, speech: {})",
        utterance.duration_secs(),
        utterance.stop,
        utterance.has_speech
    );

    let stt = SpeechToText::new(config.openai_api_key, &config.stt)?;
    let text = stt.transcribe_utterance(&utterance).await;

    if text.is_empty() {
        println!("No speech transcribed.");
    } else {
        println!("Transcription: '{text}'");
    }
    Ok(())
}

/// Send one message through the conversation adapter
async fn test_chat(message: &str) -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Chat test");
    println!("You: {message}");

    let mut chat = ChatClient::new(config.openai_api_key, &config.chat)?;
    let reply = chat.respond(message).await;

    println!("Assistant: {reply}");
    Ok(())
}

/// Synthesize and play one utterance
async fn test_speak(text: &str) -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Speech output test");
    println!("Speaking: \"{text}\"\n");

    let tts = TextToSpeech::new(config.openai_api_key, config.tts)?;
    let mp3 = tts.synthesize(text).await?;
    println!("Got {} bytes of audio", mp3.len());

    let playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3)?;

    println!("\n---");
    println!("If you heard the speech, output is working.");
    Ok(())
}
