//! # Note Tracking
//!
//! Turns the per-block pitch estimate into a monophonic event stream. The only
//! state is the currently sounding note; an event is emitted only when the
//! estimate differs from it.

use tracing::debug;

use crate::midi::{NoteEvent, NoteEvents};

#[derive(Debug, Clone, Default)]
pub struct NoteTracker {
    current: Option<i32>,
}

impl NoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The note currently sounding, `None` during silence.
    pub fn current(&self) -> Option<i32> {
        self.current
    }

    /// Feeds the note detected in the latest block (`None` for silence).
    ///
    /// Returns nothing when the note is unchanged. Otherwise returns an off
    /// event for the previous note if one was sounding, followed by an on
    /// event for the new note if there is one.
    pub fn update(&mut self, next: Option<i32>) -> NoteEvents {
        let mut events = NoteEvents::new();
        if next == self.current {
            return events;
        }

        if let Some(previous) = self.current {
            debug!("OFF {} (-> {:?})", previous, next);
            events.push(NoteEvent::off(previous));
        }
        if let Some(note) = next {
            debug!("ON  ({:?} ->) {}", self.current, note);
            events.push(NoteEvent::on(note));
        }

        self.current = next;
        events
    }

    /// Silences the tracker, returning the off event for a sounding note.
    pub fn reset(&mut self) -> Option<NoteEvent> {
        self.current.take().map(NoteEvent::off)
    }
}
