//! core/tok-controls/src/compute.rs
//! Numeric policies behind each control's `compute_features`: concurrent-onset
//! sweeps, duration-class buckets, and quantiles. Assumes `Event::internal_duration`
//! has already been filled by the encoder's preprocessing pass (§4.4).

use tok_model::{Bar, Event, Piece, Track};

/// Clips `value` into `[lo, hi]` then subtracts `lo`, landing in `[0, hi-lo]`.
/// Matches the spec's "clipped to `[1,6]-1`" / "`[0,17]`" phrasing.
fn clip_and_offset(value: i64, lo: i64, hi: i64) -> u8 {
    value.clamp(lo, hi).saturating_sub(lo) as u8
}

/// Resolves a bar's event-index list into full [`Event`] values, in the
/// bar's existing (already-sorted) order.
fn bar_events<'a>(piece: &'a Piece, bar: &Bar) -> Vec<&'a Event> {
    bar.events.iter().map(|&idx| &piece.events[idx]).collect()
}

/// Sweeps a bar's onset/offset events in time order and samples the
/// concurrent-onset count at every onset. Returns the raw (unclipped) peak
/// count and the full sample sequence (for track-level min/max-of-peaks and
/// bar-level min/max-within-bar use).
fn polyphony_samples(piece: &Piece, bar: &Bar) -> Vec<u32> {
    let mut concurrent = 0i64;
    let mut samples = Vec::new();
    for event in bar_events(piece, bar) {
        if event.is_offset() {
            concurrent = (concurrent - 1).max(0);
        } else {
            concurrent += 1;
            samples.push(concurrent as u32);
        }
    }
    samples
}

/// Number of onset events in a bar ("unique-onset-count" per §4.3's table).
fn onset_count(piece: &Piece, bar: &Bar) -> u32 {
    bar.events.iter().filter(|&&idx| piece.events[idx].is_onset()).count() as u32
}

/// `clip(log2(duration/3), 0, 5)` duration-class bucket for one note.
fn duration_class(duration_ticks: u32) -> u8 {
    if duration_ticks == 0 {
        return 0;
    }
    let raw = (f64::from(duration_ticks) / 3.0).log2();
    raw.floor().clamp(0.0, 5.0) as u8
}

/// `TrackLevelOnsetPolyphony`: min/max of per-bar peak concurrent onsets
/// across the track, each clipped to `[1,6]-1`.
#[must_use]
pub fn track_onset_polyphony(piece: &Piece, track: &Track) -> Option<(u8, u8)> {
    let peaks: Vec<i64> =
        track.bars.iter().filter_map(|b| polyphony_samples(piece, b).into_iter().max()).map(i64::from).collect();
    let (&lo, &hi) = (peaks.iter().min()?, peaks.iter().max()?);
    Some((clip_and_offset(lo, 1, 6), clip_and_offset(hi, 1, 6)))
}

/// `TrackLevelOnsetDensity`: min/max per-bar onset count across the track,
/// each clipped to `[0,17]`.
#[must_use]
pub fn track_onset_density(piece: &Piece, track: &Track) -> Option<(u8, u8)> {
    let counts: Vec<i64> = track.bars.iter().map(|b| i64::from(onset_count(piece, b))).collect();
    let (&lo, &hi) = (counts.iter().min()?, counts.iter().max()?);
    Some((clip_and_offset(lo, 0, 17), clip_and_offset(hi, 0, 17)))
}

/// `TrackLevelNoteDuration`: which of the 6 duration classes appear anywhere
/// in the track.
#[must_use]
pub fn track_note_duration_classes(piece: &Piece, track: &Track) -> [bool; 6] {
    let mut seen = [false; 6];
    for bar in &track.bars {
        for event in bar_events(piece, bar) {
            if event.is_onset() {
                seen[duration_class(event.internal_duration) as usize] = true;
            }
        }
    }
    seen
}

/// Index into a sorted slice for the given percentile (nearest-rank,
/// 0-indexed), used by both `PolyphonyQuantile` and `NoteDurationQuantile`.
fn percentile_index(len: usize, percentile: f64) -> usize {
    if len == 0 {
        return 0;
    }
    (((percentile / 100.0) * (len - 1) as f64).round() as usize).min(len - 1)
}

/// `PolyphonyQuantile`: 15th/85th percentile of instantaneous polyphony on
/// the flat roll (every bar's onset samples concatenated), clipped into the
/// 10-class domain.
#[must_use]
pub fn polyphony_quantile(piece: &Piece, track: &Track) -> Option<(u8, u8)> {
    let mut all: Vec<u32> = track.bars.iter().flat_map(|b| polyphony_samples(piece, b)).collect();
    if all.is_empty() {
        return None;
    }
    all.sort_unstable();
    let lo = all[percentile_index(all.len(), 15.0)];
    let hi = all[percentile_index(all.len(), 85.0)];
    Some((clip_and_offset(i64::from(lo), 0, 9), clip_and_offset(i64::from(hi), 0, 9)))
}

/// `NoteDurationQuantile`: 15th/85th percentile of per-note duration class.
#[must_use]
pub fn note_duration_quantile(piece: &Piece, track: &Track) -> Option<(u8, u8)> {
    let mut classes: Vec<u8> = track
        .bars
        .iter()
        .flat_map(|b| bar_events(piece, b))
        .filter(|e| e.is_onset())
        .map(|e| duration_class(e.internal_duration))
        .collect();
    if classes.is_empty() {
        return None;
    }
    classes.sort_unstable();
    let lo = classes[percentile_index(classes.len(), 15.0)];
    let hi = classes[percentile_index(classes.len(), 85.0)];
    Some((lo, hi))
}

/// Fixed bin edges for `NoteDensity`, in average-notes-per-bar. The source's
/// per-instrument quantile table is not reconstructable from the distilled
/// spec; this crate uses one shared table across instruments (recorded as
/// an explicit Open Question resolution in `DESIGN.md`).
const NOTE_DENSITY_BIN_EDGES: [f64; 9] = [1.0, 2.0, 3.5, 5.0, 7.0, 9.5, 13.0, 18.0, 25.0];

/// `NoteDensity`: average notes/bar over non-empty bars, binned into one of
/// 10 classes by [`NOTE_DENSITY_BIN_EDGES`].
#[must_use]
pub fn note_density_class(piece: &Piece, track: &Track) -> Option<u8> {
    let non_empty: Vec<u32> = track.bars.iter().map(|b| onset_count(piece, b)).filter(|&c| c > 0).collect();
    if non_empty.is_empty() {
        return None;
    }
    let average = non_empty.iter().map(|&c| f64::from(c)).sum::<f64>() / non_empty.len() as f64;
    let class = NOTE_DENSITY_BIN_EDGES.iter().filter(|&&edge| average >= edge).count();
    Some(class as u8)
}

/// `PitchRange`: observed min/max pitch across the track's onset events.
#[must_use]
pub fn pitch_range(piece: &Piece, track: &Track) -> Option<(u8, u8)> {
    let pitches: Vec<u8> =
        track.bars.iter().flat_map(|b| bar_events(piece, b)).filter(|e| e.is_onset()).map(|e| e.pitch).collect();
    Some((*pitches.iter().min()?, *pitches.iter().max()?))
}

/// `BarLevelOnsetPolyphony`: min/max concurrent-onset sample within one bar,
/// clipped to `[1,6]-1` (confirmed the same 6-class domain as the
/// track-level control, §9 open question).
#[must_use]
pub fn bar_onset_polyphony(piece: &Piece, bar: &Bar) -> Option<(u8, u8)> {
    let samples = polyphony_samples(piece, bar);
    let (&lo, &hi) = (samples.iter().min()?, samples.iter().max()?);
    Some((clip_and_offset(i64::from(lo), 1, 6), clip_and_offset(i64::from(hi), 1, 6)))
}

/// `BarLevelOnsetDensity`: this bar's onset count, clipped to `[0,17]`.
#[must_use]
pub fn bar_onset_density(piece: &Piece, bar: &Bar) -> u8 {
    clip_and_offset(i64::from(onset_count(piece, bar)), 0, 17)
}

#[cfg(test)]
mod tests {
    use tok_model::{Event, TrackType};

    use super::*;

    fn track_with_notes(notes: &[(u32, u8, u32)]) -> (Piece, Track) {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        for &(time, pitch, duration) in notes {
            let onset_idx = piece.push_event(Event { internal_duration: duration, ..Event::new(time, pitch, 100, 0) });
            let offset_idx = piece.push_event(Event::new(time + duration, pitch, 0, 0));
            bar.events.extend([onset_idx, offset_idx]);
        }
        bar.events.sort_by_key(|&idx| piece.events[idx].sort_key());
        track.bars.push(bar);
        (piece, track)
    }

    #[test]
    fn onset_polyphony_counts_overlap() {
        let (piece, track) = track_with_notes(&[(0, 60, 12), (0, 64, 12)]);
        let (lo, hi) = track_onset_polyphony(&piece, &track).unwrap();
        assert_eq!((lo, hi), (1, 1)); // clip(2,1,6)-1 = 1
    }

    #[test]
    fn onset_density_counts_onsets_per_bar() {
        let (piece, track) = track_with_notes(&[(0, 60, 12), (12, 64, 12)]);
        let (lo, hi) = track_onset_density(&piece, &track).unwrap();
        assert_eq!((lo, hi), (2, 2));
    }

    #[test]
    fn pitch_range_tracks_observed_extremes() {
        let (piece, track) = track_with_notes(&[(0, 40, 12), (12, 90, 12)]);
        assert_eq!(pitch_range(&piece, &track), Some((40, 90)));
    }

    #[test]
    fn note_density_bins_by_average_per_bar() {
        let (piece, track) = track_with_notes(&[(0, 60, 12)]);
        assert_eq!(note_density_class(&piece, &track), Some(0));
    }

    #[test]
    fn bar_onset_density_clips_to_seventeen() {
        let mut piece = Piece::new(12, 120.0);
        let mut bar = Bar::new(4, 4);
        for i in 0..25u32 {
            let idx = piece.push_event(Event::new(i, 60, 100, 0));
            bar.events.push(idx);
        }
        assert_eq!(bar_onset_density(&piece, &bar), 17);
    }
}
