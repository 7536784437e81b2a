use tracing::debug;

use crate::error::{ParseError, ValidationError};
use crate::melody::Melody;
use crate::note::{Note, PitchClass};

pub const DEFAULT_DURATION: u8 = 4;
pub const DEFAULT_OCTAVE: u8 = 6;
pub const DEFAULT_TEMPO: u32 = 63;

/// Values from the RTTTL settings section (`d=`, `o=`, `b=`).
///
/// Defaults are kept as written; they are only checked when a note token
/// leaves out its duration or octave and falls back to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub duration: u32,
    pub octave: u32,
    pub tempo: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            duration: u32::from(DEFAULT_DURATION),
            octave: u32::from(DEFAULT_OCTAVE),
            tempo: DEFAULT_TEMPO,
        }
    }
}

/// Parse a full RTTTL string (`name:settings:notes`) into a Melody.
///
/// Either every note decodes or the whole string is rejected.
pub fn decode(input: &str) -> Result<Melody, ParseError> {
    let (name, rest) = input.split_once(':').ok_or(ParseError::MissingSettings)?;
    let (settings, data) = rest.split_once(':').ok_or(ParseError::MissingData)?;

    let settings = parse_settings(settings)?;
    debug!(
        name,
        duration = settings.duration,
        octave = settings.octave,
        tempo = settings.tempo,
        "decoded RTTTL header"
    );

    let mut notes = Vec::new();
    for (idx, token) in data.split(',').enumerate() {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParseError::EmptyNote(idx + 1));
        }
        notes.push(decode_token(token, settings.duration, settings.octave)?);
    }

    Ok(Melody::new(name, settings.tempo, notes)?)
}

/// Parse the comma-separated `key=value` settings section.
/// Unknown keys are skipped so newer settings don't break older readers.
pub fn parse_settings(section: &str) -> Result<Settings, ParseError> {
    let mut settings = Settings::default();

    for entry in section.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let mut parts = entry.split('=');
        let (key, value) = match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) => (key.trim(), value.trim()),
            _ => return Err(ParseError::MalformedSetting(entry.to_string())),
        };

        if !matches!(key, "d" | "o" | "b") {
            debug!(key, value, "ignoring unknown RTTTL setting");
            continue;
        }

        let value: u32 = value.parse().map_err(|_| ParseError::InvalidSettingValue {
            key: key.to_string(),
            value: value.to_string(),
        })?;

        match key {
            "d" => settings.duration = value,
            "o" => settings.octave = value,
            _ => settings.tempo = value,
        }
    }

    Ok(settings)
}

/// Decode one note token: `duration? pitch dot? octave? dot?`.
///
/// `h` is read as `B`. The dot may sit before or after the octave digit.
pub fn decode_note(
    token: &str,
    default_duration: u8,
    default_octave: u8,
) -> Result<Note, ParseError> {
    decode_token(token, u32::from(default_duration), u32::from(default_octave))
}

fn decode_token(
    token: &str,
    default_duration: u32,
    default_octave: u32,
) -> Result<Note, ParseError> {
    let malformed = || ParseError::MalformedNote(token.to_string());
    let mut chars = token.trim().chars().peekable();

    // Duration: up to two digits
    let mut duration: Option<u8> = None;
    for _ in 0..2 {
        match chars.next_if(char::is_ascii_digit) {
            Some(c) => {
                let digit = c as u8 - b'0';
                duration = Some(duration.unwrap_or(0) * 10 + digit);
            }
            None => break,
        }
    }

    let letter = chars.next().ok_or_else(malformed)?.to_ascii_uppercase();
    let sharp = chars.next_if_eq(&'#').is_some();
    let pitch = match (letter, sharp) {
        ('P', false) => PitchClass::Rest,
        ('C', false) => PitchClass::C,
        ('C', true) => PitchClass::CSharp,
        ('D', false) => PitchClass::D,
        ('D', true) => PitchClass::DSharp,
        ('E', false) => PitchClass::E,
        ('F', false) => PitchClass::F,
        ('F', true) => PitchClass::FSharp,
        ('G', false) => PitchClass::G,
        ('G', true) => PitchClass::GSharp,
        ('A', false) => PitchClass::A,
        ('A', true) => PitchClass::ASharp,
        ('B', false) | ('H', false) => PitchClass::B,
        _ => return Err(malformed()),
    };

    let dot_before = chars.next_if_eq(&'.').is_some();
    let octave = chars.next_if(char::is_ascii_digit).map(|c| c as u8 - b'0');
    let dot_after = chars.next_if_eq(&'.').is_some();

    if chars.next().is_some() {
        return Err(malformed());
    }

    let duration = match duration {
        Some(d) => d,
        None => u8::try_from(default_duration)
            .map_err(|_| ValidationError::InvalidDuration(default_duration))?,
    };
    let octave = match octave {
        Some(o) => o,
        None => u8::try_from(default_octave)
            .map_err(|_| ValidationError::InvalidOctave(default_octave))?,
    };

    Ok(Note::new(pitch, octave, duration, dot_before || dot_after)?)
}
