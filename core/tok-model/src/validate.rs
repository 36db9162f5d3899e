//! core/tok-model/src/validate.rs
//! Pre-planning validation (§4.9): piece shape/time checks, event re-sort,
//! and status-vs-piece agreement.

use crate::bar::Bar;
use crate::error::PieceError;
use crate::hyperparam::HyperParam;
use crate::piece::Piece;
use crate::status::Status;

/// Validates piece-level invariants: nonzero resolution, equal bar counts
/// across tracks, consistent time signatures per bar index, and every
/// event's time within its bar's bound (offsets may touch the upper bound,
/// onsets may not).
pub fn validate_piece(piece: &Piece) -> Result<(), PieceError> {
    if piece.resolution == 0 {
        return Err(PieceError::ZeroResolution);
    }

    let expected = piece.bar_count();
    for (track_idx, track) in piece.tracks.iter().enumerate() {
        if track.bars.len() != expected {
            return Err(PieceError::UnequalTrackLength {
                track: track_idx,
                actual: track.bars.len(),
                expected,
            });
        }
    }

    for bar_idx in 0..expected {
        let mut reference: Option<(u8, u8)> = None;
        for track in &piece.tracks {
            let bar = &track.bars[bar_idx];
            let ts = (bar.ts_numerator, bar.ts_denominator);
            match reference {
                None => reference = Some(ts),
                Some(r) if r == ts => {}
                Some(_) => return Err(PieceError::InconsistentTimeSignature { bar: bar_idx }),
            }
        }
    }

    for (track_idx, track) in piece.tracks.iter().enumerate() {
        for (bar_idx, bar) in track.bars.iter().enumerate() {
            let limit = bar.tick_length(piece.resolution);
            for &event_idx in &bar.events {
                let event = piece
                    .events
                    .get(event_idx)
                    .ok_or_else(|| PieceError::InvalidField {
                        field: "bar.events".to_string(),
                        reason: format!("index {event_idx} out of range"),
                    })?;
                let in_range = if event.is_offset() { event.time <= limit } else { event.time < limit };
                if !in_range {
                    return Err(PieceError::EventOutsideBar {
                        track: track_idx,
                        bar: bar_idx,
                        event: event_idx,
                        time: event.time,
                        limit,
                    });
                }
            }
        }
    }

    Ok(())
}

/// Re-sorts every bar's event-index list in place, using the canonical
/// (time, offset-before-onset, pitch) order.
pub fn sort_bar_events(piece: &mut Piece) {
    let events = piece.events.clone();
    for track in &mut piece.tracks {
        for bar in &mut track.bars {
            bar.events.sort_by_key(|&idx| events[idx].sort_key());
        }
    }
}

/// Pads every status track's backing piece track with empty 4/4 bars until
/// it has at least as many bars as the status references.
///
/// The reference implementation's inner loop here iterated a fixed, unrelated
/// bound (`for (int i = t->bars_size(); i < 5; i++) {}`) and did nothing;
/// it is dropped entirely, keeping only the outer per-track padding loop
/// (§9 design note).
pub fn pad_piece_with_status(piece: &mut Piece, status: &Status) {
    for (track_idx, status_track) in status.tracks.iter().enumerate() {
        let Some(track) = piece.tracks.get_mut(track_idx) else { continue };
        while track.bars.len() < status_track.selected_bars.len() {
            track.bars.push(Bar::new(4, 4));
        }
    }
}

/// Validates a [`Status`] against its [`Piece`] and the hyperparameters:
/// every track id in range, total selected bars at least `model_dim`,
/// resample tracks select every bar, ignored tracks select none.
pub fn validate_status(piece: &Piece, status: &Status, hyperparam: &HyperParam) -> Result<(), PieceError> {
    let len = piece.tracks.len();
    let mut total_selected = 0usize;

    for (idx, status_track) in status.tracks.iter().enumerate() {
        if idx >= len {
            return Err(PieceError::TrackIndexOutOfRange { index: idx, len });
        }
        total_selected += status_track.selected_count();

        if status_track.autoregressive
            && status_track.selected_count() != status_track.selected_bars.len()
        {
            return Err(PieceError::ResampleTrackPartiallySelected { track: idx });
        }
        if status_track.ignore && status_track.selected_count() > 0 {
            return Err(PieceError::IgnoredTrackHasSelection { track: idx });
        }
    }

    if total_selected < hyperparam.model_dim {
        return Err(PieceError::TooFewSelectedBars {
            selected: total_selected,
            model_dim: hyperparam.model_dim,
        });
    }

    Ok(())
}
