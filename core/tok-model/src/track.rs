//! core/tok-model/src/track.rs
//! Track kind and the track record itself.

use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::features::TrackFeatures;

/// The four track kinds the encoder recognizes. Drum-ness is derived from
/// this by a fixed table ([`TrackType::is_drum`]), never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    /// A regular pitched instrument track.
    Standard,
    /// A regular percussion track.
    StandardDrum,
    /// An auxiliary (secondary) pitched instrument track.
    Aux,
    /// An auxiliary percussion track.
    AuxDrum,
}

impl TrackType {
    /// `true` for `StandardDrum`/`AuxDrum`.
    #[must_use]
    pub fn is_drum(self) -> bool {
        matches!(self, Self::StandardDrum | Self::AuxDrum)
    }
}

/// One instrument's timeline: its kind, instrument id, and ordered bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    /// Track kind; determines drum-ness and which attribute controls apply.
    pub track_type: TrackType,
    /// General MIDI instrument program, `0..=127`.
    pub instrument: u8,
    /// Ordered bars. Every track in a piece must have the same bar count.
    pub bars: Vec<Bar>,
    /// Computed track-level feature record, filled by the encoder's preprocessing.
    #[serde(default)]
    pub features: Option<TrackFeatures>,
}

impl Track {
    /// Builds an empty track of the given kind and instrument.
    #[must_use]
    pub fn new(track_type: TrackType, instrument: u8) -> Self {
        Self { track_type, instrument, bars: Vec::new(), features: None }
    }

    /// `true` when this track is a percussion track.
    #[must_use]
    pub fn is_drum(&self) -> bool {
        self.track_type.is_drum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drum_ness_follows_track_type() {
        assert!(!TrackType::Standard.is_drum());
        assert!(TrackType::StandardDrum.is_drum());
        assert!(!TrackType::Aux.is_drum());
        assert!(TrackType::AuxDrum.is_drum());
    }
}
