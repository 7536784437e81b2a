//! RTTTL ringtone parsing and playback timing for the Finch robot buzzer.
//!
//! ```
//! use finch_rtttl::Melody;
//!
//! let melody: Melody = "x:d=4,o=6,b=63:c,8e,g.".parse().unwrap();
//! assert_eq!(melody.notes().len(), 3);
//! assert_eq!(melody.to_string(), "x:d=4,o=6,b=63:C,8E,G.");
//! ```

pub mod error;
pub mod interrupt;
pub mod library;
pub mod melody;
pub mod note;
pub mod parser;
pub mod playback;
pub mod synth;

pub use error::{ParseError, PlaybackError, ValidationError};
pub use melody::Melody;
pub use note::{Note, PitchClass};
pub use playback::{CancelToken, PlaybackOptions, PlaybackOutcome, ToneSink};
