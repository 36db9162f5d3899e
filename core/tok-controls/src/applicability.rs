//! core/tok-controls/src/applicability.rs
//! Where a control appears in the token stream, and which track kinds it
//! attaches to.

use bitflags::bitflags;

/// Where in the per-track token stream a control's tokens are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLevel {
    /// Once per piece (unused by any control in the default registry, kept
    /// for controls a caller may register alongside it).
    Piece,
    /// Emitted before the `INSTRUMENT` token, once per track.
    TrackPreInstrument,
    /// Emitted after `INSTRUMENT`, once per track.
    Track,
    /// Emitted once per bar.
    Bar,
}

bitflags! {
    /// Which track kinds a control participates on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TrackApplicability: u8 {
        /// Pitched (non-drum) tracks.
        const INSTRUMENT = 0b01;
        /// Percussion tracks.
        const DRUM = 0b10;
        /// Both pitched and percussion tracks.
        const BOTH = Self::INSTRUMENT.bits() | Self::DRUM.bits();
    }
}

impl TrackApplicability {
    /// `true` when a control with this applicability participates on a
    /// track of the given drum-ness.
    #[must_use]
    pub fn check_valid_track(self, is_drum: bool) -> bool {
        if is_drum { self.contains(Self::DRUM) } else { self.contains(Self::INSTRUMENT) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_only_rejects_drum_tracks() {
        assert!(TrackApplicability::INSTRUMENT.check_valid_track(false));
        assert!(!TrackApplicability::INSTRUMENT.check_valid_track(true));
    }

    #[test]
    fn both_accepts_either() {
        assert!(TrackApplicability::BOTH.check_valid_track(false));
        assert!(TrackApplicability::BOTH.check_valid_track(true));
    }
}
