//! core/tok-codec/src/delta.rs
//! Two-pass microtiming resample (§4.4 "Delta resample"). Rescales every
//! event's time from the piece's current resolution to `decode_resolution`,
//! folding in its microtiming delta, while resolving legato overlaps where
//! an onset's delta would otherwise land it on top of the offset that
//! precedes it.

use std::collections::HashMap;

use tok_model::Piece;

/// Rescales `x` ticks at `from` resolution to `to` resolution, truncating
/// (rounding down) rather than to the nearest tick.
fn rescale(x: u32, from: u32, to: u32) -> u32 {
    if from == 0 {
        return x;
    }
    (u64::from(x) * u64::from(to) / u64::from(from)) as u32
}

/// Resamples every event's time from the piece's current resolution to
/// `decode_resolution`, applying each event's `delta` and then clearing it.
/// `internal_duration` is left untouched, in the pre-rescale resolution.
///
/// Pass 1 walks each track's bar-flattened timeline and looks for an onset
/// with nonzero delta whose rescaled time coincides with the rescaled time
/// of the same-pitch offset immediately preceding it (a legato overlap):
/// in that case the delta is moved onto the offset instead, recorded in a
/// `delta_to_apply` map keyed by event index, and the onset's own delta is
/// dropped. Pass 2 rebuilds the event pool via [`Piece::clear_events`],
/// re-emitting every event in its original pool order (not resorted by the
/// new time) with the rescaled-plus-delta time clamped to `>= 0`.
pub fn resample_delta(piece: &mut Piece, decode_resolution: u32) {
    let resolution = piece.resolution;
    let mut delta_to_apply: HashMap<usize, i32> = HashMap::new();

    for track in &piece.tracks {
        let mut bar_starts = Vec::with_capacity(track.bars.len());
        let mut acc = 0u32;
        for bar in &track.bars {
            bar_starts.push(acc);
            acc += bar.tick_length(resolution);
        }

        let mut entries: Vec<(u32, usize)> = Vec::new();
        for (bar_idx, bar) in track.bars.iter().enumerate() {
            for &idx in &bar.events {
                entries.push((bar_starts[bar_idx] + piece.events[idx].time, idx));
            }
        }
        entries.sort_by_key(|&(t, idx)| {
            let ev = piece.events[idx];
            (t, ev.is_onset(), ev.pitch)
        });

        for window in entries.windows(2) {
            let (prev_time, prev_idx) = window[0];
            let (cur_time, cur_idx) = window[1];
            let prev = piece.events[prev_idx];
            let cur = piece.events[cur_idx];
            let legato_overlap = cur.is_onset()
                && cur.delta != 0
                && prev.is_offset()
                && prev.pitch == cur.pitch
                && rescale(prev_time, resolution, decode_resolution) == rescale(cur_time, resolution, decode_resolution);
            if legato_overlap {
                delta_to_apply.insert(prev_idx, cur.delta);
                delta_to_apply.insert(cur_idx, 0);
            }
        }
    }

    let mut membership = vec![(0usize, 0usize); piece.events.len()];
    for (track_idx, track) in piece.tracks.iter().enumerate() {
        for (bar_idx, bar) in track.bars.iter().enumerate() {
            for &idx in &bar.events {
                membership[idx] = (track_idx, bar_idx);
            }
        }
    }

    let old_events = piece.events.clone();
    piece.clear_events();

    for (idx, mut event) in old_events.into_iter().enumerate() {
        let delta = delta_to_apply.get(&idx).copied().unwrap_or(event.delta);
        let rescaled_time = rescale(event.time, resolution, decode_resolution);
        event.time = rescaled_time.saturating_add_signed(delta);
        event.delta = 0;

        let new_idx = piece.push_event(event);
        let (track_idx, bar_idx) = membership[idx];
        piece.tracks[track_idx].bars[bar_idx].events.push(new_idx);
    }
    piece.resolution = decode_resolution;
}

#[cfg(test)]
mod tests {
    use tok_model::{Bar, Event, Track, TrackType};

    use super::*;

    #[test]
    fn rescales_time_proportionally() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: 12, ..Event::new(12, 60, 100, 0) });
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, 24);
        assert_eq!(piece.events[0].time, 24);
        assert_eq!(piece.events[0].internal_duration, 12);
        assert_eq!(piece.resolution, 24);
    }

    #[test]
    fn rescale_truncates_rather_than_rounds() {
        assert_eq!(rescale(7, 12, 5), 2);
    }

    #[test]
    fn plain_delta_is_applied_after_rescale() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: 12, ..Event::new(12, 60, 100, 3) });
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, 12);
        assert_eq!(piece.events[0].time, 15);
        assert_eq!(piece.events[0].delta, 0);
    }

    #[test]
    fn negative_delta_clamps_at_zero() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: 12, ..Event::new(2, 60, 100, -5) });
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, 12);
        assert_eq!(piece.events[0].time, 0);
    }

    #[test]
    fn legato_overlap_moves_onset_delta_onto_preceding_offset() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let offset = piece.push_event(Event::new(12, 60, 0, 0));
        let onset = piece.push_event(Event { internal_duration: 12, ..Event::new(12, 60, 100, 2) });
        bar.events.extend([offset, onset]);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, 12);
        assert_eq!(piece.events[onset].delta, 0);
        assert_eq!(piece.events[onset].time, 12);
        assert_eq!(piece.events[offset].time, 14);
    }

    #[test]
    fn rebuild_preserves_original_pool_order() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let high = piece.push_event(Event::new(6, 72, 100, 0));
        let low = piece.push_event(Event::new(0, 40, 100, 0));
        bar.events.extend([high, low]);
        track.bars.push(bar);
        piece.tracks.push(track);

        resample_delta(&mut piece, 12);
        assert_eq!(piece.events[0].pitch, 72);
        assert_eq!(piece.events[1].pitch, 40);
    }
}
