//! core/tok-model/src/event.rs
//! Flat event pool entries: a single note onset or offset.

use serde::{Deserialize, Serialize};

/// A single note onset or offset, bar-relative in time.
///
/// Events live once in [`crate::Piece::events`]; bars address them by index.
/// `velocity == 0` marks an offset (note-off); anything else is an onset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Event {
    /// Bar-relative tick.
    pub time: u32,
    /// MIDI pitch, `0..=127`.
    pub pitch: u8,
    /// MIDI velocity, `0..=127`; `0` means note-off.
    pub velocity: u8,
    /// Signed microtiming offset in delta-resolution units.
    pub delta: i32,
    /// Ticks until the matching offset. Computed by encoder preprocessing;
    /// `0` until then.
    #[serde(default)]
    pub internal_duration: u32,
}

impl Event {
    /// Builds an onset/offset event with `internal_duration` defaulted to zero.
    #[must_use]
    pub fn new(time: u32, pitch: u8, velocity: u8, delta: i32) -> Self {
        Self { time, pitch, velocity, delta, internal_duration: 0 }
    }

    /// `true` when this event is a note-off (`velocity == 0`).
    #[must_use]
    pub fn is_offset(&self) -> bool {
        self.velocity == 0
    }

    /// `true` when this event is a note-on.
    #[must_use]
    pub fn is_onset(&self) -> bool {
        !self.is_offset()
    }

    /// Sort key matching the bar-ordering contract: by time, then offsets
    /// before onsets at the same time, then by pitch.
    #[must_use]
    pub fn sort_key(&self) -> (u32, bool, u8) {
        (self.time, self.is_onset(), self.pitch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_before_onset_at_same_time() {
        let onset = Event::new(10, 60, 100, 0);
        let offset = Event::new(10, 60, 0, 0);
        assert!(offset.sort_key() < onset.sort_key());
    }

    #[test]
    fn pitch_breaks_ties() {
        let low = Event::new(0, 40, 100, 0);
        let high = Event::new(0, 72, 100, 0);
        assert!(low.sort_key() < high.sort_key());
    }
}
