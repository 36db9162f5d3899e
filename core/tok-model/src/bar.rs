//! core/tok-model/src/bar.rs
//! A single bar: its time signature and the events that fall inside it.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::features::BarFeatures;

/// Bars rarely hold more than this many events; beyond it we spill to the heap.
const INLINE_EVENTS: usize = 8;

/// One musical measure. Event membership is stored as indices into
/// [`crate::Piece::events`], not owned copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bar {
    /// Time signature numerator.
    pub ts_numerator: u8,
    /// Time signature denominator.
    pub ts_denominator: u8,
    /// Indices into the piece's flat event pool.
    pub events: SmallVec<[usize; INLINE_EVENTS]>,
    /// Computed bar-level feature record, filled by the encoder's preprocessing.
    #[serde(default)]
    pub features: Option<BarFeatures>,
}

impl Bar {
    /// Builds an empty bar with the given time signature.
    #[must_use]
    pub fn new(ts_numerator: u8, ts_denominator: u8) -> Self {
        Self { ts_numerator, ts_denominator, events: SmallVec::new(), features: None }
    }

    /// Quarters per bar: `4 * num / den`.
    #[must_use]
    pub fn beat_length(&self) -> f64 {
        4.0 * f64::from(self.ts_numerator) / f64::from(self.ts_denominator)
    }

    /// Upper bound (in ticks) for event times at the given `resolution`.
    #[must_use]
    pub fn tick_length(&self, resolution: u32) -> u32 {
        (self.beat_length() * f64::from(resolution)).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_four_beat_length_is_four_quarters() {
        let bar = Bar::new(4, 4);
        assert!((bar.beat_length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn six_eight_beat_length_is_three_quarters() {
        let bar = Bar::new(6, 8);
        assert!((bar.beat_length() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn tick_length_scales_by_resolution() {
        let bar = Bar::new(4, 4);
        assert_eq!(bar.tick_length(12), 48);
    }
}
