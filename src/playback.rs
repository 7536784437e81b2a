//! Turns a melody into timed tone commands and drives an output device.
//!
//! The driver owns pacing: it sends one command per note, then waits that
//! note's duration on a [`CancelToken`] so playback can be stopped between
//! (or during) notes without unwinding through the caller.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::PlaybackError;
use crate::melody::Melody;

/// Knobs applied while turning notes into device commands.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackOptions {
    /// Scales every frequency (0.5 drops an octave, 2.0 raises one).
    pub frequency_multiplier: f64,
    /// Scales every duration.
    pub duration_multiplier: f64,
    /// Silence held after the last note.
    pub trailing_pause: Duration,
    /// Silence the device before each tone. The Finch buzzer ignores a new
    /// tone while one is still sounding.
    pub retrigger: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            frequency_multiplier: 1.0,
            duration_multiplier: 1.0,
            trailing_pause: Duration::from_millis(1000),
            retrigger: true,
        }
    }
}

/// One note resolved to device units. A frequency of 0 is silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneStep {
    pub frequency_hz: u32,
    pub duration_ms: u32,
}

impl ToneStep {
    pub fn is_silent(&self) -> bool {
        self.frequency_hz == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.duration_ms))
    }
}

/// Resolve every note of `melody` to whole Hertz and milliseconds.
/// Fractions are truncated, matching what the device accepts.
pub fn schedule(melody: &Melody, options: &PlaybackOptions) -> Vec<ToneStep> {
    let ms_per_whole = options.duration_multiplier * melody.milliseconds_per_whole_note();

    melody
        .notes()
        .iter()
        .map(|note| ToneStep {
            frequency_hz: (note.frequency() * options.frequency_multiplier) as u32,
            duration_ms: (note.duration_fraction() * ms_per_whole) as u32,
        })
        .collect()
}

/// Total time a melody takes, not counting the trailing pause.
pub fn total_duration(steps: &[ToneStep]) -> Duration {
    steps.iter().map(ToneStep::duration).sum()
}

/// A device that can sound one tone at a time.
pub trait ToneSink {
    /// Start a tone. Implementations must not block for the tone's length.
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), PlaybackError>;

    /// Stop whatever is sounding.
    fn silence(&mut self) -> Result<(), PlaybackError>;
}

impl<S: ToneSink + ?Sized> ToneSink for &mut S {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), PlaybackError> {
        (**self).tone(frequency_hz, duration_ms)
    }

    fn silence(&mut self) -> Result<(), PlaybackError> {
        (**self).silence()
    }
}

/// Sink that only logs what it would play. Used for dry runs.
#[derive(Debug, Default)]
pub struct LogSink {
    pub tones: usize,
}

impl ToneSink for LogSink {
    fn tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), PlaybackError> {
        self.tones += 1;
        info!(frequency_hz, duration_ms, "tone");
        Ok(())
    }

    fn silence(&mut self) -> Result<(), PlaybackError> {
        debug!("silence");
        Ok(())
    }
}

/// Cooperative stop signal shared between the player and whoever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cond) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `timeout` or until cancelled. Returns true if cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, cond) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);

        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            cancelled = cond
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        *cancelled
    }
}

/// How a call to [`play`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed,
    Cancelled { played: usize },
}

/// Play `melody` on `sink`, one note at a time.
///
/// Cancellation is checked before every note and interrupts the wait for the
/// current one; it ends playback with [`PlaybackOutcome::Cancelled`] rather
/// than an error. Only device failures are errors.
pub fn play<S: ToneSink>(
    melody: &Melody,
    mut sink: S,
    options: &PlaybackOptions,
    cancel: &CancelToken,
) -> Result<PlaybackOutcome, PlaybackError> {
    let steps = schedule(melody, options);
    info!(
        name = melody.name(),
        notes = steps.len(),
        total_ms = total_duration(&steps).as_millis() as u64,
        "playing melody"
    );

    for (played, step) in steps.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(played, "playback cancelled");
            return Ok(PlaybackOutcome::Cancelled { played });
        }

        debug!(
            index = played,
            frequency_hz = step.frequency_hz,
            duration_ms = step.duration_ms,
            "note"
        );
        if !step.is_silent() {
            if options.retrigger {
                sink.silence()?;
            }
            sink.tone(step.frequency_hz, step.duration_ms)?;
        }

        if cancel.wait(step.duration()) {
            sink.silence()?;
            warn!(played = played + 1, "playback cancelled");
            return Ok(PlaybackOutcome::Cancelled { played: played + 1 });
        }
    }

    // A cancel during the trailing pause still counts as a finished melody.
    cancel.wait(options.trailing_pause);
    info!(name = melody.name(), "playback finished");
    Ok(PlaybackOutcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Command {
        Tone(u32, u32),
        Silence,
    }

    #[derive(Default)]
    struct RecordingSink {
        commands: Vec<Command>,
        cancel_after_tones: Option<(usize, CancelToken)>,
    }

    impl ToneSink for RecordingSink {
        fn tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), PlaybackError> {
            self.commands.push(Command::Tone(frequency_hz, duration_ms));
            if let Some((limit, token)) = &self.cancel_after_tones {
                let tones = self
                    .commands
                    .iter()
                    .filter(|c| matches!(c, Command::Tone(..)))
                    .count();
                if tones >= *limit {
                    token.cancel();
                }
            }
            Ok(())
        }

        fn silence(&mut self) -> Result<(), PlaybackError> {
            self.commands.push(Command::Silence);
            Ok(())
        }
    }

    struct BrokenSink;

    impl ToneSink for BrokenSink {
        fn tone(&mut self, _: u32, _: u32) -> Result<(), PlaybackError> {
            Err(PlaybackError::Disconnected)
        }

        fn silence(&mut self) -> Result<(), PlaybackError> {
            Ok(())
        }
    }

    fn quick() -> PlaybackOptions {
        PlaybackOptions {
            trailing_pause: Duration::ZERO,
            ..PlaybackOptions::default()
        }
    }

    #[test]
    fn test_schedule_resolves_hz_and_ms() {
        // 120 bpm: whole note = 2000 ms
        let melody = Melody::decode("t:d=4,o=4,b=120:a,8p,2c.5").unwrap();
        let steps = schedule(&melody, &PlaybackOptions::default());
        assert_eq!(
            steps,
            vec![
                ToneStep { frequency_hz: 440, duration_ms: 500 },
                ToneStep { frequency_hz: 0, duration_ms: 250 },
                ToneStep { frequency_hz: 523, duration_ms: 1500 },
            ]
        );
        assert!(steps[1].is_silent());
        assert_eq!(total_duration(&steps), Duration::from_millis(2250));
    }

    #[test]
    fn test_schedule_applies_multipliers() {
        let melody = Melody::decode("t:d=4,o=4,b=120:a").unwrap();
        let options = PlaybackOptions {
            frequency_multiplier: 0.5,
            duration_multiplier: 2.0,
            ..PlaybackOptions::default()
        };
        assert_eq!(
            schedule(&melody, &options),
            vec![ToneStep { frequency_hz: 220, duration_ms: 1000 }]
        );
    }

    #[test]
    fn test_play_sends_commands_in_order() {
        let melody = Melody::decode("t:d=32,o=5,b=2000:c,p,d").unwrap();
        let mut sink = RecordingSink::default();
        let outcome = play(&melody, &mut sink, &quick(), &CancelToken::new()).unwrap();

        assert_eq!(outcome, PlaybackOutcome::Completed);
        assert_eq!(
            sink.commands,
            vec![
                Command::Silence,
                Command::Tone(523, 3),
                Command::Silence,
                Command::Tone(587, 3),
            ]
        );
    }

    #[test]
    fn test_play_without_retrigger() {
        let melody = Melody::decode("t:d=32,o=5,b=2000:c,d").unwrap();
        let mut sink = RecordingSink::default();
        let options = PlaybackOptions {
            retrigger: false,
            ..quick()
        };
        play(&melody, &mut sink, &options, &CancelToken::new()).unwrap();
        assert_eq!(
            sink.commands,
            vec![Command::Tone(523, 3), Command::Tone(587, 3)]
        );
    }

    #[test]
    fn test_cancelled_before_start() {
        let melody = Melody::decode("t:d=32,o=5,b=2000:c,d").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut sink = RecordingSink::default();
        let outcome = play(&melody, &mut sink, &quick(), &cancel).unwrap();
        assert_eq!(outcome, PlaybackOutcome::Cancelled { played: 0 });
        assert!(sink.commands.is_empty());
    }

    #[test]
    fn test_cancel_stops_remaining_notes() {
        // whole notes at 60 bpm would take 4 s each without cancellation
        let melody = Melody::decode("t:d=1,o=5,b=60:c,d,e,f").unwrap();
        let cancel = CancelToken::new();
        let mut sink = RecordingSink {
            cancel_after_tones: Some((1, cancel.clone())),
            ..RecordingSink::default()
        };

        let started = Instant::now();
        let outcome = play(&melody, &mut sink, &quick(), &cancel).unwrap();

        assert_eq!(outcome, PlaybackOutcome::Cancelled { played: 1 });
        assert!(started.elapsed() < Duration::from_secs(4));
        let tones = sink
            .commands
            .iter()
            .filter(|c| matches!(c, Command::Tone(..)))
            .count();
        assert_eq!(tones, 1);
        assert_eq!(sink.commands.last(), Some(&Command::Silence));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let melody = Melody::decode("t:d=1,o=5,b=60:c,d").unwrap();
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            remote.cancel();
        });

        let outcome = play(&melody, LogSink::default(), &quick(), &cancel).unwrap();
        handle.join().unwrap();
        assert_eq!(outcome, PlaybackOutcome::Cancelled { played: 1 });
    }

    #[test]
    fn test_device_error_propagates() {
        let melody = Melody::decode("t:d=32,o=5,b=2000:c").unwrap();
        let result = play(&melody, BrokenSink, &quick(), &CancelToken::new());
        assert!(matches!(result, Err(PlaybackError::Disconnected)));
    }

    #[test]
    fn test_wait_returns_early_when_cancelled() {
        let cancel = CancelToken::new();
        assert!(!cancel.wait(Duration::from_millis(5)));
        cancel.cancel();
        let started = Instant::now();
        assert!(cancel.wait(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_log_sink_counts_tones() {
        let melody = Melody::decode("t:d=32,o=5,b=2000:c,p,d").unwrap();
        let mut sink = LogSink::default();
        play(&melody, &mut sink, &quick(), &CancelToken::new()).unwrap();
        assert_eq!(sink.tones, 2);
    }
}
