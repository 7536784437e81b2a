//! Error types shared by the note model, the RTTTL decoder and playback.

/// A note or melody field outside its domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid note '{0}'")]
    InvalidPitch(String),

    #[error("invalid octave {0} (must be 0-8)")]
    InvalidOctave(u32),

    #[error("illegal note duration {0} (must be one of 1, 2, 4, 8, 16, 32)")]
    InvalidDuration(u32),

    #[error("beats per minute must be between 1 and 2000, got {0}")]
    InvalidTempo(u32),

    #[error("the name cannot contain a colon")]
    NameContainsColon,
}

/// Malformed RTTTL text. A decode either yields a whole melody or one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid RTTTL input: missing settings")]
    MissingSettings,

    #[error("invalid RTTTL input: missing data")]
    MissingData,

    #[error("invalid RTTTL input: unable to parse setting '{0}'")]
    MalformedSetting(String),

    #[error("invalid RTTTL input: setting '{key}' has non-numeric value '{value}'")]
    InvalidSettingValue { key: String, value: String },

    #[error("invalid RTTTL input: empty note at position {0}")]
    EmptyNote(usize),

    #[error("invalid RTTTL input: unable to parse note '{0}'")]
    MalformedNote(String),

    #[error("invalid RTTTL input: {0}")]
    Invalid(#[from] ValidationError),
}

/// Failure talking to the output device while a melody plays.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("no output audio device available")]
    NoDevice,

    #[error("audio device error: {0}")]
    Device(String),

    #[error("audio thread disconnected")]
    Disconnected,

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}
