use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc;

use crate::error::PlaybackError;
use crate::playback::ToneSink;

/// A command sent to the audio thread
enum AudioCommand {
    /// Play a tone at a given frequency for a duration in seconds
    Tone { freq: f64, duration_secs: f64 },
    /// Cut the current tone
    Silence,
}

/// Plays tones through the default audio output as a sine wave.
///
/// `tone` only hands the command to the audio callback; the caller paces
/// the melody. The stream stops when the sink is dropped.
pub struct SpeakerSink {
    cmd_tx: mpsc::Sender<AudioCommand>,
    _stream: cpal::Stream,
}

impl SpeakerSink {
    pub fn open() -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(PlaybackError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| PlaybackError::Device(format!("failed to get default output config: {}", e)))?;

        let sample_rate = config.sample_rate() as f64;
        let channels = usize::from(config.channels()).max(1);

        let (cmd_tx, cmd_rx) = mpsc::channel::<AudioCommand>();

        // Audio generation state
        let mut phase: f64 = 0.0;
        let mut current_freq: Option<f64> = None;
        let mut frames_remaining: usize = 0;

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Drain every pending command; the last one wins
                    while let Ok(cmd) = cmd_rx.try_recv() {
                        match cmd {
                            AudioCommand::Tone { freq, duration_secs } => {
                                current_freq = Some(freq);
                                frames_remaining = (duration_secs * sample_rate) as usize;
                                phase = 0.0;
                            }
                            AudioCommand::Silence => {
                                current_freq = None;
                                frames_remaining = 0;
                            }
                        }
                    }

                    for frame in data.chunks_mut(channels) {
                        let value = match current_freq {
                            Some(freq) if frames_remaining > 0 => {
                                let v = (phase * freq * 2.0 * std::f64::consts::PI / sample_rate)
                                    .sin()
                                    * 0.3;
                                phase += 1.0;
                                frames_remaining -= 1;
                                v as f32
                            }
                            _ => 0.0,
                        };
                        for sample in frame.iter_mut() {
                            *sample = value;
                        }
                    }
                },
                move |err| {
                    tracing::error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| PlaybackError::Device(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| PlaybackError::Device(format!("failed to play stream: {}", e)))?;

        Ok(Self {
            cmd_tx,
            _stream: stream,
        })
    }
}

impl ToneSink for SpeakerSink {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), PlaybackError> {
        self.cmd_tx
            .send(AudioCommand::Tone {
                freq: f64::from(frequency_hz),
                duration_secs: f64::from(duration_ms) / 1000.0,
            })
            .map_err(|_| PlaybackError::Disconnected)
    }

    fn silence(&mut self) -> Result<(), PlaybackError> {
        self.cmd_tx
            .send(AudioCommand::Silence)
            .map_err(|_| PlaybackError::Disconnected)
    }
}
