//! core/tok-model/src/features.rs
//! Feature records written by attribute controls (`tok-controls`) and read by
//! the encoder and sampler.

use serde::{Deserialize, Serialize};

/// Piece-level computed/requested features (currently just genre).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PieceFeatures {
    /// Genre label, when known.
    pub genre: Option<String>,
}

/// Track-level computed features. One instance per track; written by every
/// `TRACK`/`TRACK_PRE_INSTRUMENT`-level attribute control in registry order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackFeatures {
    /// Minimum concurrent onsets across bars, clipped to `[1,6]-1`.
    pub min_polyphony: Option<u8>,
    /// Maximum concurrent onsets across bars, clipped to `[1,6]-1`.
    pub max_polyphony: Option<u8>,
    /// Minimum unique-onset count per bar, clipped to `[0,17]`.
    pub min_density: Option<u8>,
    /// Maximum unique-onset count per bar, clipped to `[0,17]`.
    pub max_density: Option<u8>,
    /// `contains duration class X` booleans, one per of the 6 duration classes.
    pub note_duration_classes: [bool; 6],
    /// 15th percentile of instantaneous polyphony on the flat roll.
    pub polyphony_quantile_min: Option<u8>,
    /// 85th percentile of instantaneous polyphony on the flat roll.
    pub polyphony_quantile_max: Option<u8>,
    /// 15th percentile of per-note duration class.
    pub duration_quantile_min: Option<u8>,
    /// 85th percentile of per-note duration class.
    pub duration_quantile_max: Option<u8>,
    /// Average notes/bar over non-empty bars, binned into one of 10 classes.
    pub note_density_class: Option<u8>,
    /// Observed minimum pitch.
    pub pitch_min: Option<u8>,
    /// Observed maximum pitch.
    pub pitch_max: Option<u8>,
}

/// Bar-level computed features. One instance per bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarFeatures {
    /// Minimum concurrent onsets in this bar.
    pub min_polyphony: Option<u8>,
    /// Maximum concurrent onsets in this bar.
    pub max_polyphony: Option<u8>,
    /// Unique-onset count in this bar, clipped to `[0,17]`.
    pub onset_density: Option<u8>,
}
