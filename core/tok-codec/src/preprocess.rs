//! core/tok-codec/src/preprocess.rs
//! Encoder-specific, idempotent piece preparation: infer `internal_duration`
//! for every onset, then run every registered attribute control's feature
//! computation (§4.4 "Preprocess").

use std::collections::{HashMap, VecDeque};

use tok_model::validate::validate_piece;
use tok_model::Piece;

use crate::error::CodecError;

/// Runs duration inference and attribute-feature computation over `piece`,
/// in place. Idempotent: calling it twice leaves the piece unchanged after
/// the first call (duration inference reads the same onset/offset pairing
/// regardless of previously-computed durations).
pub fn preprocess(piece: &mut Piece) -> Result<(), CodecError> {
    validate_piece(piece)?;
    infer_internal_durations(piece);
    tok_controls::compute_all_features(piece);
    Ok(())
}

/// Pairs every onset with the next same-pitch offset in the same track,
/// on a bar-flattened timeline, and records the tick gap as
/// `internal_duration`. Drum onsets always get duration `1` (drums never
/// carry an explicit `NOTE_DURATION` token).
fn infer_internal_durations(piece: &mut Piece) {
    let resolution = piece.resolution;

    for track_idx in 0..piece.tracks.len() {
        let is_drum = piece.tracks[track_idx].is_drum();

        let mut bar_starts = Vec::with_capacity(piece.tracks[track_idx].bars.len());
        let mut acc = 0u32;
        for bar in &piece.tracks[track_idx].bars {
            bar_starts.push(acc);
            acc += bar.tick_length(resolution);
        }

        let mut abs_time: HashMap<usize, u32> = HashMap::new();
        let mut entries: Vec<usize> = Vec::new();
        for (bar_idx, bar) in piece.tracks[track_idx].bars.iter().enumerate() {
            for &ev_idx in &bar.events {
                abs_time.insert(ev_idx, bar_starts[bar_idx] + piece.events[ev_idx].time);
                entries.push(ev_idx);
            }
        }
        entries.sort_by_key(|&idx| {
            let ev = piece.events[idx];
            (abs_time[&idx], ev.is_onset(), ev.pitch)
        });

        if is_drum {
            for &idx in &entries {
                if piece.events[idx].is_onset() {
                    piece.events[idx].internal_duration = 1;
                }
            }
            continue;
        }

        let mut open: HashMap<u8, VecDeque<usize>> = HashMap::new();
        for &idx in &entries {
            let event = piece.events[idx];
            if event.is_onset() {
                open.entry(event.pitch).or_default().push_back(idx);
            } else if let Some(onset_idx) = open.get_mut(&event.pitch).and_then(VecDeque::pop_front) {
                let onset_time = abs_time[&onset_idx];
                let offset_time = abs_time[&idx];
                piece.events[onset_idx].internal_duration = offset_time.saturating_sub(onset_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tok_model::{Bar, Event, Track, TrackType};

    use super::*;

    #[test]
    fn pairs_onset_with_matching_offset() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event::new(0, 60, 100, 0));
        let offset = piece.push_event(Event::new(12, 60, 0, 0));
        bar.events.extend([onset, offset]);
        track.bars.push(bar);
        piece.tracks.push(track);

        preprocess(&mut piece).unwrap();
        assert_eq!(piece.events[onset].internal_duration, 12);
    }

    #[test]
    fn drum_onsets_always_get_duration_one() {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::StandardDrum, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event::new(0, 36, 100, 0));
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        preprocess(&mut piece).unwrap();
        assert_eq!(piece.events[onset].internal_duration, 1);
    }
}
