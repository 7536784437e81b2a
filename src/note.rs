use std::fmt;
use std::str::FromStr;

use crate::error::{ParseError, ValidationError};

/// Durations a note may take, as denominators of a whole note.
pub const DURATIONS: [u8; 6] = [1, 2, 4, 8, 16, 32];

/// Highest octave a note may sit in.
pub const MAX_OCTAVE: u8 = 8;

/// Pitch classes of the chromatic scale, plus a rest (no tone) at index 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PitchClass {
    Rest,
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in index order.
    pub const ALL: [PitchClass; 13] = [
        PitchClass::Rest,
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Index 0-12, Rest first.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_rest(self) -> bool {
        self == PitchClass::Rest
    }

    /// Upper-case RTTTL symbol ("P" for a rest).
    pub fn symbol(self) -> &'static str {
        match self {
            PitchClass::Rest => "P",
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Frequency in Hz at octave 0 (C0 = 16.35 Hz). A rest has none.
    pub fn base_frequency(self) -> f64 {
        match self {
            PitchClass::Rest => 0.0,
            PitchClass::C => 16.35,
            PitchClass::CSharp => 17.32,
            PitchClass::D => 18.35,
            PitchClass::DSharp => 19.45,
            PitchClass::E => 20.60,
            PitchClass::F => 21.83,
            PitchClass::FSharp => 23.12,
            PitchClass::G => 24.50,
            PitchClass::GSharp => 25.96,
            PitchClass::A => 27.50,
            PitchClass::ASharp => 29.14,
            PitchClass::B => 30.87,
        }
    }
}

impl FromStr for PitchClass {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PitchClass::ALL
            .iter()
            .copied()
            .find(|p| p.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::InvalidPitch(s.to_string()))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}

/// A single musical note (or rest) with its octave, duration and dotted flag.
///
/// Every field is validated on the way in: constructors and setters reject
/// out-of-domain values instead of clamping them. Equality compares every
/// field, including the octave of a rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pitch: PitchClass,
    octave: u8,
    duration: u8,
    dotted: bool,
}

impl Note {
    pub fn new(
        pitch: PitchClass,
        octave: u8,
        duration: u8,
        dotted: bool,
    ) -> Result<Self, ValidationError> {
        check_octave(octave)?;
        check_duration(duration)?;
        Ok(Self {
            pitch,
            octave,
            duration,
            dotted,
        })
    }

    /// Build a note from its symbol ("P", "C", "C#", ... "B"; any case).
    pub fn from_symbol(
        symbol: &str,
        octave: u8,
        duration: u8,
        dotted: bool,
    ) -> Result<Self, ValidationError> {
        Self::new(symbol.parse()?, octave, duration, dotted)
    }

    /// Decode one RTTTL note token, filling in omitted fields from the defaults.
    pub fn decode(token: &str, default_duration: u8, default_octave: u8) -> Result<Self, ParseError> {
        crate::parser::decode_note(token, default_duration, default_octave)
    }

    pub fn pitch(&self) -> PitchClass {
        self.pitch
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    pub fn duration(&self) -> u8 {
        self.duration
    }

    pub fn is_dotted(&self) -> bool {
        self.dotted
    }

    pub fn is_rest(&self) -> bool {
        self.pitch.is_rest()
    }

    pub fn set_pitch(&mut self, pitch: PitchClass) {
        self.pitch = pitch;
    }

    pub fn set_octave(&mut self, octave: u8) -> Result<(), ValidationError> {
        check_octave(octave)?;
        self.octave = octave;
        Ok(())
    }

    pub fn set_duration(&mut self, duration: u8) -> Result<(), ValidationError> {
        check_duration(duration)?;
        self.duration = duration;
        Ok(())
    }

    pub fn set_dotted(&mut self, dotted: bool) {
        self.dotted = dotted;
    }

    /// Frequency in Hz. Always 0 for a rest.
    pub fn frequency(&self) -> f64 {
        self.pitch.base_frequency() * 2.0_f64.powi(i32::from(self.octave))
    }

    /// Share of a whole note this note lasts, e.g. 0.25 for a quarter note.
    pub fn duration_fraction(&self) -> f64 {
        let fraction = 1.0 / f64::from(self.duration);
        if self.dotted { fraction * 1.5 } else { fraction }
    }

    /// Shortest RTTTL token for this note given a melody's defaults.
    pub fn encode(&self, default_duration: u8, default_octave: u8) -> String {
        let mut token = String::with_capacity(5);
        // fmt::Write for String never fails
        let _ = self.write_token(&mut token, Some(default_duration), Some(default_octave));
        token
    }

    fn write_token<W: fmt::Write>(
        &self,
        out: &mut W,
        default_duration: Option<u8>,
        default_octave: Option<u8>,
    ) -> fmt::Result {
        if default_duration != Some(self.duration) {
            write!(out, "{}", self.duration)?;
        }
        out.write_str(self.pitch.symbol())?;
        if self.dotted {
            out.write_char('.')?;
        }
        // A rest has no pitch, so its octave is never written.
        if default_octave != Some(self.octave) && !self.is_rest() {
            write!(out, "{}", self.octave)?;
        }
        Ok(())
    }
}

/// Full token with no defaults applied (duration always present).
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_token(f, None, None)
    }
}

pub(crate) fn check_octave(octave: u8) -> Result<(), ValidationError> {
    if octave > MAX_OCTAVE {
        return Err(ValidationError::InvalidOctave(u32::from(octave)));
    }
    Ok(())
}

pub(crate) fn check_duration(duration: u8) -> Result<(), ValidationError> {
    if !DURATIONS.contains(&duration) {
        return Err(ValidationError::InvalidDuration(u32::from(duration)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: PitchClass, octave: u8, duration: u8, dotted: bool) -> Note {
        Note::new(pitch, octave, duration, dotted).unwrap()
    }

    #[test]
    fn test_symbols_round_trip() {
        for pitch in PitchClass::ALL {
            assert_eq!(pitch.symbol().parse::<PitchClass>().unwrap(), pitch);
            assert_eq!(
                pitch.symbol().to_lowercase().parse::<PitchClass>().unwrap(),
                pitch
            );
        }
        assert_eq!(PitchClass::Rest.index(), 0);
        assert_eq!(PitchClass::B.index(), 12);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        assert_eq!(
            "H".parse::<PitchClass>(),
            Err(ValidationError::InvalidPitch("H".into()))
        );
        assert!(Note::from_symbol("E#", 4, 4, false).is_err());
        assert!(Note::from_symbol("", 4, 4, false).is_err());
    }

    #[test]
    fn test_rest_has_no_frequency() {
        for octave in 0..=MAX_OCTAVE {
            assert_eq!(note(PitchClass::Rest, octave, 4, false).frequency(), 0.0);
        }
    }

    #[test]
    fn test_octave_doubles_frequency() {
        for pitch in PitchClass::ALL.into_iter().skip(1) {
            for octave in 0..MAX_OCTAVE {
                let low = note(pitch, octave, 4, false).frequency();
                let high = note(pitch, octave + 1, 4, false).frequency();
                assert!((high - 2.0 * low).abs() < 1e-9, "{pitch}{octave}");
            }
        }
    }

    #[test]
    fn test_reference_frequencies() {
        assert!((note(PitchClass::C, 0, 4, false).frequency() - 16.35).abs() < 1e-9);
        assert!((note(PitchClass::C, 6, 4, false).frequency() - 1046.4).abs() < 0.5);
        assert!((note(PitchClass::A, 4, 4, false).frequency() - 440.0).abs() < 0.1);
    }

    #[test]
    fn test_duration_fraction() {
        assert_eq!(note(PitchClass::C, 4, 4, false).duration_fraction(), 0.25);
        assert_eq!(note(PitchClass::C, 4, 4, true).duration_fraction(), 0.375);
        for duration in DURATIONS {
            let plain = note(PitchClass::G, 4, duration, false).duration_fraction();
            let dotted = note(PitchClass::G, 4, duration, true).duration_fraction();
            assert!((plain - 1.0 / f64::from(duration)).abs() < 1e-12);
            assert!((dotted - 1.5 * plain).abs() < 1e-12);
        }
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            Note::new(PitchClass::C, 9, 4, false),
            Err(ValidationError::InvalidOctave(9))
        );
        assert_eq!(
            Note::new(PitchClass::C, 4, 3, false),
            Err(ValidationError::InvalidDuration(3))
        );
        assert!(Note::new(PitchClass::C, 4, 0, false).is_err());
        assert!(Note::new(PitchClass::C, 4, 64, false).is_err());
    }

    #[test]
    fn test_setters_reject_without_changing() {
        let mut n = note(PitchClass::D, 5, 8, false);
        assert!(n.set_octave(12).is_err());
        assert!(n.set_duration(7).is_err());
        assert_eq!(n.octave(), 5);
        assert_eq!(n.duration(), 8);

        n.set_octave(3).unwrap();
        n.set_duration(16).unwrap();
        n.set_dotted(true);
        n.set_pitch(PitchClass::FSharp);
        assert_eq!(n, note(PitchClass::FSharp, 3, 16, true));
    }

    #[test]
    fn test_encode_omits_defaults() {
        let n = note(PitchClass::FSharp, 5, 8, false);
        assert_eq!(n.encode(8, 5), "F#");
        assert_eq!(n.encode(4, 5), "8F#");
        assert_eq!(n.encode(8, 6), "F#5");
        assert_eq!(note(PitchClass::E, 6, 16, true).encode(4, 5), "16E.6");
    }

    #[test]
    fn test_encode_rest_never_has_octave() {
        let rest = note(PitchClass::Rest, 3, 2, true);
        assert_eq!(rest.encode(4, 6), "2P.");
        assert_eq!(rest.to_string(), "2P.");
    }

    #[test]
    fn test_display_writes_everything() {
        assert_eq!(note(PitchClass::ASharp, 0, 32, false).to_string(), "32A#0");
    }

    #[test]
    fn test_equality_includes_rest_octave() {
        use std::collections::HashSet;

        let low = note(PitchClass::Rest, 4, 8, false);
        let high = note(PitchClass::Rest, 6, 8, false);
        assert_ne!(low, high);
        assert_eq!(low.to_string(), high.to_string());

        let set: HashSet<Note> = [low, high, low].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_ne!(
            note(PitchClass::C, 4, 8, false),
            note(PitchClass::C, 6, 8, false)
        );
    }
}
