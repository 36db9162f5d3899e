//! core/tok-model/src/status.rs
//! The user-facing generation request: which bars to generate, and under
//! what attribute constraints.

use serde::{Deserialize, Serialize};

/// Per-track role inferred from a [`StatusTrack`]'s selected bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionClass {
    /// No bars selected: the track conditions generation but is not touched.
    Condition,
    /// Every bar selected: the whole track is regenerated autoregressively.
    Resample,
    /// Some but not all bars selected: a bar-infill target.
    Infill,
}

/// Per-bar attribute overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusBar {
    /// Requested time signature for this bar, if constrained.
    pub time_signature: Option<(u8, u8)>,
    /// Requested minimum polyphony class for this bar.
    pub min_polyphony: Option<u8>,
    /// Requested maximum polyphony class for this bar.
    pub max_polyphony: Option<u8>,
    /// Requested onset-density class for this bar.
    pub onset_density: Option<u8>,
}

/// Per-track generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusTrack {
    /// Which bars (by index) to generate.
    pub selected_bars: Vec<bool>,
    /// `true` if every selected bar should be regenerated from scratch.
    pub autoregressive: bool,
    /// `true` if this track should be excluded from both conditioning and
    /// generation.
    pub ignore: bool,
    /// Hard cap on concurrent onsets for this track during generation.
    pub polyphony_hard_limit: Option<u32>,
    /// Sampling temperature override for this track.
    pub temperature: Option<f32>,
    /// Requested instrument program (pre pretrain-remap).
    pub instrument: Option<u8>,
    /// Requested note-density class.
    pub density: Option<u8>,
    /// Requested minimum polyphony class.
    pub min_polyphony: Option<u8>,
    /// Requested maximum polyphony class.
    pub max_polyphony: Option<u8>,
    /// Requested minimum note-duration class.
    pub min_duration: Option<u8>,
    /// Requested maximum note-duration class.
    pub max_duration: Option<u8>,
    /// Requested genre label.
    pub genre: Option<String>,
    /// Per-bar overrides, one entry per bar.
    pub bars: Vec<StatusBar>,
}

impl StatusTrack {
    /// Number of bars marked for generation.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected_bars.iter().filter(|&&b| b).count()
    }

    /// Classifies this track per §4.6: no selection is `Condition`, every
    /// bar selected is `Resample`, otherwise `Infill`.
    #[must_use]
    pub fn classify(&self) -> SelectionClass {
        let selected = self.selected_count();
        if selected == 0 {
            SelectionClass::Condition
        } else if selected == self.selected_bars.len() {
            SelectionClass::Resample
        } else {
            SelectionClass::Infill
        }
    }
}

/// The full generation request: one [`StatusTrack`] per track in the piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Status {
    /// Per-track requests, aligned by index with `Piece::tracks`.
    pub tracks: Vec<StatusTrack>,
}
