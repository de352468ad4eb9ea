//! Note events and their three-byte MIDI channel-voice encoding.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, Result};

/// Note Off status byte, channel 0.
pub const NOTE_OFF: u8 = 0x80;
/// Note On status byte, channel 0.
pub const NOTE_ON: u8 = 0x90;
/// Velocity sent with every event, on and off alike.
pub const VELOCITY: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteEventKind {
    On,
    Off,
}

/// A note starting or stopping. The note number is unchecked until encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub kind: NoteEventKind,
    pub note: i32,
}

/// Events produced by one block: none, one, or an off followed by an on.
pub type NoteEvents = SmallVec<[NoteEvent; 2]>;

impl NoteEvent {
    pub fn on(note: i32) -> Self {
        Self {
            kind: NoteEventKind::On,
            note,
        }
    }

    pub fn off(note: i32) -> Self {
        Self {
            kind: NoteEventKind::Off,
            note,
        }
    }

    pub fn status(&self) -> u8 {
        match self.kind {
            NoteEventKind::On => NOTE_ON,
            NoteEventKind::Off => NOTE_OFF,
        }
    }

    /// Encodes the event as `[status, note, velocity]`.
    ///
    /// # Errors
    /// * `Error::NoteOutOfRange` if the note does not fit in 0-127
    pub fn to_midi(&self) -> Result<[u8; 3]> {
        match u8::try_from(self.note) {
            Ok(note) if note <= 0x7F => Ok([self.status(), note, VELOCITY]),
            _ => Err(Error::NoteOutOfRange(self.note)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_bytes() {
        assert_eq!(NoteEvent::on(60).to_midi(), Ok([0x90, 60, 64]));
    }

    #[test]
    fn note_off_bytes() {
        assert_eq!(NoteEvent::off(78).to_midi(), Ok([0x80, 78, 64]));
    }

    #[test]
    fn range_edges() {
        assert_eq!(NoteEvent::on(0).to_midi(), Ok([0x90, 0, 64]));
        assert_eq!(NoteEvent::on(127).to_midi(), Ok([0x90, 127, 64]));
        assert_eq!(NoteEvent::on(128).to_midi(), Err(Error::NoteOutOfRange(128)));
        assert_eq!(NoteEvent::off(-3).to_midi(), Err(Error::NoteOutOfRange(-3)));
    }

    #[test]
    fn serializes_kind_in_snake_case() {
        let json = serde_json::to_string(&NoteEvent::off(61)).unwrap();
        assert_eq!(json, r#"{"kind":"off","note":61}"#);
    }
}
