//! core/tok-model/src/piece.rs
//! The root record: resolution, tempo, tracks, and the flat event pool.

use serde::{Deserialize, Serialize};

use crate::features::PieceFeatures;
use crate::track::Track;

/// A multi-track, bar-segmented piece of symbolic music.
///
/// Events are stored once in `events`; bars address them by index
/// (see [`crate::Bar::events`]). Invariant: every track has the same number
/// of bars, and every event index appearing in a bar is valid — enforced by
/// [`crate::validate::validate_piece`], not by the constructors here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Piece {
    /// Ticks per quarter note, the internal time unit.
    pub resolution: u32,
    /// Tempo in quarter notes per minute.
    pub tempo: f32,
    /// Ordered tracks.
    pub tracks: Vec<Track>,
    /// Flat pool of events, addressed by index from bars.
    pub events: Vec<crate::event::Event>,
    /// Computed piece-level feature record.
    #[serde(default)]
    pub features: Option<PieceFeatures>,
}

impl Piece {
    /// Builds an empty piece with the given resolution and tempo.
    #[must_use]
    pub fn new(resolution: u32, tempo: f32) -> Self {
        Self { resolution, tempo, tracks: Vec::new(), events: Vec::new(), features: None }
    }

    /// Number of bars per track, or `0` for an empty piece. Does not itself
    /// verify that every track agrees; see [`crate::validate::validate_piece`].
    #[must_use]
    pub fn bar_count(&self) -> usize {
        self.tracks.first().map_or(0, |t| t.bars.len())
    }

    /// Appends an event to the flat pool and returns its index.
    pub fn push_event(&mut self, event: crate::event::Event) -> usize {
        self.events.push(event);
        self.events.len() - 1
    }

    /// Drops every event and clears every bar's event-index list, in
    /// preparation for a rebuild (used by `resample_delta`). Indices handed
    /// out before this call are no longer valid.
    pub fn clear_events(&mut self) {
        self.events.clear();
        for track in &mut self.tracks {
            for bar in &mut track.bars {
                bar.events.clear();
            }
        }
    }
}
