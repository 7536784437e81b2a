use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};

use finch_rtttl::interrupt::KeyWatcher;
use finch_rtttl::playback::{self, LogSink};
use finch_rtttl::synth::SpeakerSink;
use finch_rtttl::{CancelToken, Melody, PlaybackOptions, PlaybackOutcome, library};

#[derive(Parser)]
#[command(name = "finch-rtttl", about = "Parse, re-encode and play RTTTL ringtones")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a melody and display its notes
    Parse {
        #[command(flatten)]
        source: Source,
    },

    /// Print the shortest RTTTL form of a melody
    Encode {
        #[command(flatten)]
        source: Source,

        /// Default duration to write in the header
        #[arg(long, requires = "octave")]
        duration: Option<u8>,

        /// Default octave to write in the header
        #[arg(long, requires = "duration")]
        octave: Option<u8>,
    },

    /// Play a melody through the speakers
    Play {
        #[command(flatten)]
        source: Source,

        /// Override tempo (BPM)
        #[arg(long)]
        tempo: Option<u32>,

        /// Multiply every frequency (0.5 = one octave down)
        #[arg(long, default_value_t = 1.0)]
        frequency_multiplier: f64,

        /// Multiply every duration (2.0 = half speed)
        #[arg(long, default_value_t = 1.0)]
        duration_multiplier: f64,

        /// Silence after the last note, in milliseconds
        #[arg(long, default_value_t = 1000)]
        pause_ms: u64,

        /// Log the tones instead of playing them
        #[arg(long)]
        dry_run: bool,

        /// Don't watch the keyboard for Esc / q / Ctrl-C
        #[arg(long)]
        no_keys: bool,
    },

    /// List the built-in melodies
    List,
}

/// Where the melody comes from: exactly one of these.
#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// RTTTL text, e.g. "x:d=4,o=6,b=63:c,e,g"
    rtttl: Option<String>,

    /// Path to a file holding RTTTL text
    #[arg(long)]
    file: Option<PathBuf>,

    /// Built-in melody, by index or name (see `list`)
    #[arg(long)]
    builtin: Option<String>,
}

impl Source {
    fn load(&self) -> Result<Melody> {
        let melody = if let Some(text) = &self.rtttl {
            Melody::decode(text)?
        } else if let Some(path) = &self.file {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Melody::decode(text.trim())
                .with_context(|| format!("decoding {}", path.display()))?
        } else if let Some(key) = &self.builtin {
            library::load(key).ok_or_else(|| anyhow!("no built-in melody '{}'", key))??
        } else {
            bail!("no melody given");
        };
        Ok(melody)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Parse { source } => {
            let melody = source.load()?;
            print_melody(&melody);
        }
        Command::Encode {
            source,
            duration,
            octave,
        } => {
            let melody = source.load()?;
            match (duration, octave) {
                (Some(d), Some(o)) => println!("{}", melody.encode(d, o)?),
                _ => println!("{}", melody),
            }
        }
        Command::Play {
            source,
            tempo,
            frequency_multiplier,
            duration_multiplier,
            pause_ms,
            dry_run,
            no_keys,
        } => {
            // Decode fully before touching the device: a bad melody plays nothing
            let mut melody = source.load()?;
            if let Some(t) = tempo {
                melody.set_tempo(t)?;
            }

            let options = PlaybackOptions {
                frequency_multiplier,
                duration_multiplier,
                trailing_pause: Duration::from_millis(pause_ms),
                ..PlaybackOptions::default()
            };
            play(&melody, &options, dry_run, no_keys)?;
        }
        Command::List => {
            for (index, name) in library::names().enumerate() {
                println!("{:>2}  {}", index, name);
            }
        }
    }

    Ok(())
}

fn play(melody: &Melody, options: &PlaybackOptions, dry_run: bool, no_keys: bool) -> Result<()> {
    println!(
        "Playing: {} ({} notes, {} BPM)",
        melody.name(),
        melody.notes().len(),
        melody.tempo()
    );

    let cancel = CancelToken::new();
    let watcher = if watch_keys(dry_run, no_keys, std::io::stdin().is_terminal()) {
        println!("Press Esc or q to stop");
        Some(KeyWatcher::spawn(cancel.clone())?)
    } else {
        None
    };

    let outcome = if dry_run {
        playback::play(melody, LogSink::default(), options, &cancel)
    } else {
        let sink = SpeakerSink::open().context("opening audio output")?;
        playback::play(melody, sink, options, &cancel)
    };
    drop(watcher);

    match outcome.context("playback failed")? {
        PlaybackOutcome::Completed => {}
        PlaybackOutcome::Cancelled { played } => {
            println!("Stopped after {} of {} notes", played, melody.notes().len());
        }
    }
    Ok(())
}

/// Raw mode breaks line endings on stderr, where dry runs log their tones.
fn watch_keys(dry_run: bool, no_keys: bool, stdin_is_tty: bool) -> bool {
    stdin_is_tty && !no_keys && !dry_run
}

fn print_melody(melody: &Melody) {
    println!("Name: {}", melody.name());
    println!("Tempo: {} BPM", melody.tempo());
    println!(
        "Whole note: {:.1} ms",
        melody.milliseconds_per_whole_note()
    );
    println!("Notes: {}", melody.notes().len());
    println!();

    let ms_per_whole = melody.milliseconds_per_whole_note();
    for note in melody.notes() {
        let length = format!(
            "1/{}{}",
            note.duration(),
            if note.is_dotted() { " dotted" } else { "" }
        );
        if note.is_rest() {
            println!(
                "  Rest {:<12} {:>7.1} ms",
                length,
                note.duration_fraction() * ms_per_whole
            );
        } else {
            println!(
                "  {:<2} octave {}  {:<12} {:>7.1} Hz {:>7.1} ms",
                note.pitch(),
                note.octave(),
                length,
                note.frequency(),
                note.duration_fraction() * ms_per_whole
            );
        }
    }
}
