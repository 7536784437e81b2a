use std::fmt;
use std::str::FromStr;

use crate::error::{ParseError, ValidationError};
use crate::note::{Note, check_duration, check_octave};

/// Name given to a melody whose name is empty.
pub const UNNAMED: &str = "Unnamed";

pub const MIN_TEMPO: u32 = 1;
pub const MAX_TEMPO: u32 = 2000;

/// Defaults used when encoding a melody with no notes.
const FALLBACK_DURATION: u8 = 4;
const FALLBACK_OCTAVE: u8 = 4;

/// A named sequence of notes played in order at a fixed tempo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Melody {
    name: String,
    tempo: u32,
    notes: Vec<Note>,
}

impl Melody {
    pub fn new(
        name: &str,
        tempo: u32,
        notes: impl IntoIterator<Item = Note>,
    ) -> Result<Self, ValidationError> {
        let mut melody = Self {
            name: String::from(UNNAMED),
            tempo: crate::parser::DEFAULT_TEMPO,
            notes: notes.into_iter().collect(),
        };
        melody.set_name(name)?;
        melody.set_tempo(tempo)?;
        Ok(melody)
    }

    /// Parse an RTTTL string.
    pub fn decode(rtttl: &str) -> Result<Self, ParseError> {
        crate::parser::decode(rtttl)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Empty names become "Unnamed"; a colon would break the RTTTL header.
    pub fn set_name(&mut self, name: &str) -> Result<(), ValidationError> {
        if name.contains(':') {
            return Err(ValidationError::NameContainsColon);
        }
        self.name = if name.is_empty() {
            String::from(UNNAMED)
        } else {
            name.to_string()
        };
        Ok(())
    }

    /// Beats per minute.
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: u32) -> Result<(), ValidationError> {
        if !(MIN_TEMPO..=MAX_TEMPO).contains(&tempo) {
            return Err(ValidationError::InvalidTempo(tempo));
        }
        self.tempo = tempo;
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Live access to the notes; edits apply to the melody itself.
    pub fn notes_mut(&mut self) -> &mut Vec<Note> {
        &mut self.notes
    }

    /// Replace every note with a copy of `notes`.
    pub fn set_notes(&mut self, notes: &[Note]) {
        self.notes = notes.to_vec();
    }

    /// How long a whole note lasts at this tempo.
    pub fn milliseconds_per_whole_note(&self) -> f64 {
        let seconds_per_beat = 60.0 / f64::from(self.tempo);
        seconds_per_beat * 4.0 * 1000.0
    }

    /// Most used octave; first seen wins a tie, 4 when there are no notes.
    pub fn most_common_octave(&self) -> u8 {
        most_common(self.notes.iter().map(|n| (n.octave(), 1)), FALLBACK_OCTAVE)
    }

    /// Duration that saves the most characters when made the default.
    /// Two-digit durations count double; first seen wins a tie.
    pub fn most_common_duration(&self) -> u8 {
        most_common(
            self.notes.iter().map(|n| {
                let d = n.duration();
                (d, if d > 9 { 2 } else { 1 })
            }),
            FALLBACK_DURATION,
        )
    }

    /// RTTTL text using the given defaults in the header. The defaults must
    /// be ones a decoder would accept back.
    pub fn encode(
        &self,
        default_duration: u8,
        default_octave: u8,
    ) -> Result<String, ValidationError> {
        check_duration(default_duration)?;
        check_octave(default_octave)?;
        Ok(self.write_rtttl(default_duration, default_octave))
    }

    /// RTTTL text with the defaults picked to keep it short.
    pub fn encode_compact(&self) -> String {
        // Both defaults come from the notes themselves or the 4/4 fallback
        self.write_rtttl(self.most_common_duration(), self.most_common_octave())
    }

    fn write_rtttl(&self, default_duration: u8, default_octave: u8) -> String {
        let tokens: Vec<String> = self
            .notes
            .iter()
            .map(|n| n.encode(default_duration, default_octave))
            .collect();
        format!(
            "{}:d={},o={},b={}:{}",
            self.name,
            default_duration,
            default_octave,
            self.tempo,
            tokens.join(",")
        )
    }
}

/// Running-weight mode of `values`. The first value to reach the highest
/// running weight is kept, so ties go to the earliest.
fn most_common(values: impl Iterator<Item = (u8, u32)>, fallback: u8) -> u8 {
    let mut weights = [0u32; 256];
    let mut best = fallback;
    let mut best_weight = 0;

    for (value, weight) in values {
        let total = &mut weights[usize::from(value)];
        *total += weight;
        if *total > best_weight {
            best = value;
            best_weight = *total;
        }
    }

    best
}

impl fmt::Display for Melody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_compact())
    }
}

impl FromStr for Melody {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
