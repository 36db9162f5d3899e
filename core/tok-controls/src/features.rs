//! core/tok-controls/src/features.rs
//! Runs every registered control's `compute_features` over a track or bar,
//! producing the feature records `tok-codec`'s preprocessing pass attaches
//! to the piece (§4.4). Assumes durations have already been inferred.

use tok_model::{Bar, BarFeatures, Piece, Track, TrackFeatures};

use crate::compute;

/// Fills a fresh [`TrackFeatures`] from every `TRACK`-level control.
/// `Genre` (the one `TRACK_PRE_INSTRUMENT`-level control) reads
/// [`tok_model::PieceFeatures::genre`] directly and has nothing to compute
/// here; it is not touched by this function.
#[must_use]
pub fn compute_track_features(piece: &Piece, track: &Track) -> TrackFeatures {
    let mut features = TrackFeatures::default();

    if let Some((lo, hi)) = compute::track_onset_polyphony(piece, track) {
        features.min_polyphony = Some(lo);
        features.max_polyphony = Some(hi);
    }
    if let Some((lo, hi)) = compute::track_onset_density(piece, track) {
        features.min_density = Some(lo);
        features.max_density = Some(hi);
    }
    features.note_duration_classes = compute::track_note_duration_classes(piece, track);
    if let Some((lo, hi)) = compute::polyphony_quantile(piece, track) {
        features.polyphony_quantile_min = Some(lo);
        features.polyphony_quantile_max = Some(hi);
    }
    if let Some((lo, hi)) = compute::note_duration_quantile(piece, track) {
        features.duration_quantile_min = Some(lo);
        features.duration_quantile_max = Some(hi);
    }
    features.note_density_class = compute::note_density_class(piece, track);
    if let Some((lo, hi)) = compute::pitch_range(piece, track) {
        features.pitch_min = Some(lo);
        features.pitch_max = Some(hi);
    }

    features
}

/// Fills a fresh [`BarFeatures`] from every `BAR`-level control.
#[must_use]
pub fn compute_bar_features(piece: &Piece, bar: &Bar) -> BarFeatures {
    let mut features = BarFeatures::default();
    if let Some((lo, hi)) = compute::bar_onset_polyphony(piece, bar) {
        features.min_polyphony = Some(lo);
        features.max_polyphony = Some(hi);
    }
    features.onset_density = Some(compute::bar_onset_density(piece, bar));
    features
}

/// Runs [`compute_track_features`]/[`compute_bar_features`] over every
/// track and bar in the piece, in place. Idempotent, matching the encoder's
/// preprocessing contract (§4.4).
pub fn compute_all_features(piece: &mut Piece) {
    let snapshot = piece.clone();
    for track in &mut piece.tracks {
        track.features = Some(compute_track_features(&snapshot, track));
        for bar in &mut track.bars {
            bar.features = Some(compute_bar_features(&snapshot, bar));
        }
    }
}
