//! core/tok-codec/src/decode.rs
//! Rebuilds a [`Piece`] from a flat token sequence (§4.4 "Decode").

use tok_model::validate::sort_bar_events;
use tok_model::{Bar, Event, Piece, Track, TrackType};
use tok_vocab::{Representation, TokenType, TokenValue};

use crate::error::CodecError;

#[derive(Default)]
struct DecodeState {
    cur_track: Option<usize>,
    cur_bar: Option<usize>,
    cur_tick: u32,
    cur_velocity: u8,
    delta_sign: i32,
    pending_delta: i32,
    beat_length: f64,
    pending_onset: Option<usize>,
    /// Onset events whose offset overran the bar they started in, waiting
    /// to be placed: `(event index, remaining ticks past the bar boundary)`.
    offset_remain: Vec<(usize, u32)>,
}

impl DecodeState {
    fn new() -> Self {
        Self { delta_sign: 1, beat_length: 4.0, ..Default::default() }
    }
}

fn decode_track_type(value: i64) -> TrackType {
    if value == 0 {
        TrackType::Standard
    } else {
        TrackType::StandardDrum
    }
}

/// Walks `tokens` against `rep`'s decoding and rebuilds the piece they
/// encode. `resolution`/`tempo` are carried in separately since neither is
/// itself a token in the default vocabulary.
pub fn decode(tokens: &[u32], rep: &Representation, resolution: u32, tempo: f32) -> Result<Piece, CodecError> {
    let mut piece = Piece::new(resolution, tempo);
    let mut state = DecodeState::new();

    for &id in tokens {
        let (tt, value) = rep.decode(id)?;
        apply_token(&mut piece, &mut state, resolution, tt, value);
    }

    sort_bar_events(&mut piece);
    Ok(piece)
}

fn apply_token(piece: &mut Piece, state: &mut DecodeState, resolution: u32, tt: TokenType, value: TokenValue) {
    match tt {
        TokenType::PieceStart | TokenType::NumBars => {}
        TokenType::Track => {
            let TokenValue::Int(v) = value else { return };
            piece.tracks.push(Track::new(decode_track_type(v), 0));
            state.cur_track = Some(piece.tracks.len() - 1);
            state.cur_bar = None;
            state.offset_remain.clear();
        }
        TokenType::Instrument => {
            if let (Some(ti), TokenValue::Int(v)) = (state.cur_track, value) {
                piece.tracks[ti].instrument = v as u8;
            }
        }
        TokenType::Bar => {
            if let Some(ti) = state.cur_track {
                piece.tracks[ti].bars.push(Bar::new(4, 4));
                let bar_idx = piece.tracks[ti].bars.len() - 1;
                state.cur_bar = Some(bar_idx);
                state.cur_tick = 0;
                place_overrun_offsets(piece, state, ti, bar_idx, resolution);
            }
        }
        TokenType::TimeSignature => {
            let TokenValue::TimeSig(n, d) = value else { return };
            if let (Some(ti), Some(bi)) = (state.cur_track, state.cur_bar) {
                piece.tracks[ti].bars[bi].ts_numerator = n;
                piece.tracks[ti].bars[bi].ts_denominator = d;
                state.beat_length = piece.tracks[ti].bars[bi].beat_length();
            }
        }
        TokenType::TimeAbsolutePos => {
            if let TokenValue::Int(v) = value {
                state.cur_tick = v as u32;
            }
        }
        TokenType::VelocityLevel => {
            if let TokenValue::Int(v) = value {
                state.cur_velocity = v as u8;
            }
        }
        TokenType::DeltaDirection => {
            state.delta_sign = -1;
        }
        TokenType::Delta => {
            if let TokenValue::Int(v) = value {
                state.pending_delta = state.delta_sign * v as i32;
            }
            state.delta_sign = 1;
        }
        TokenType::NoteOnset => {
            let TokenValue::Int(pitch) = value else { return };
            if let (Some(ti), Some(bi)) = (state.cur_track, state.cur_bar) {
                let is_drum = piece.tracks[ti].is_drum();
                let velocity = if state.cur_velocity == 0 { 100 } else { state.cur_velocity };
                let idx = piece.push_event(Event::new(state.cur_tick, pitch as u8, velocity, state.pending_delta));
                state.pending_delta = 0;
                piece.tracks[ti].bars[bi].events.push(idx);
                if is_drum {
                    piece.events[idx].internal_duration = 1;
                    let bar_len = piece.tracks[ti].bars[bi].tick_length(resolution);
                    push_offset(piece, state, ti, bi, pitch as u8, state.cur_tick + 1, bar_len);
                    state.pending_onset = None;
                } else {
                    state.pending_onset = Some(idx);
                }
            }
        }
        TokenType::NoteDuration => {
            if let TokenValue::Int(v) = value {
                if let (Some(ti), Some(bi), Some(onset_idx)) = (state.cur_track, state.cur_bar, state.pending_onset) {
                    let duration = v as u32 + 1;
                    piece.events[onset_idx].internal_duration = duration;
                    let pitch = piece.events[onset_idx].pitch;
                    let bar_len = piece.tracks[ti].bars[bi].tick_length(resolution);
                    push_offset(piece, state, ti, bi, pitch, state.cur_tick + duration, bar_len);
                }
            }
            state.pending_onset = None;
        }
        TokenType::BarEnd => {
            state.cur_tick = (state.beat_length * f64::from(resolution)).round() as u32;
        }
        TokenType::TrackEnd => {
            state.cur_bar = None;
        }
        TokenType::FillInPlaceholder | TokenType::FillInStart | TokenType::FillInEnd => {}
        _ => {}
    }
}

/// Places an offset event either in the current bar (if `off_tick` falls
/// within `bar_len`) or records the overrun in `state.offset_remain` so a
/// later bar can pick it up.
fn push_offset(piece: &mut Piece, state: &mut DecodeState, track_idx: usize, bar_idx: usize, pitch: u8, off_tick: u32, bar_len: u32) {
    let idx = piece.push_event(Event::new(0, pitch, 0, 0));
    if off_tick <= bar_len {
        piece.events[idx].time = off_tick;
        piece.tracks[track_idx].bars[bar_idx].events.push(idx);
    } else {
        state.offset_remain.push((idx, off_tick - bar_len));
    }
}

/// At the start of a new bar, attaches every pending overrun offset whose
/// remaining ticks fit in this bar; decrements the rest by this bar's
/// length and leaves them pending.
fn place_overrun_offsets(piece: &mut Piece, state: &mut DecodeState, track_idx: usize, bar_idx: usize, resolution: u32) {
    let bar_len = piece.tracks[track_idx].bars[bar_idx].tick_length(resolution);
    let mut still_pending = Vec::new();
    for (idx, remaining) in state.offset_remain.drain(..) {
        if remaining <= bar_len {
            piece.events[idx].time = remaining;
            piece.tracks[track_idx].bars[bar_idx].events.push(idx);
        } else {
            still_pending.push((idx, remaining - bar_len));
        }
    }
    state.offset_remain = still_pending;
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tok_model::{Bar as ModelBar, Event as ModelEvent, Track as ModelTrack, TrackType as ModelTrackType};
    use tok_vocab::build_default_representation;

    use super::*;
    use crate::encode::encode_piece;

    #[test]
    fn s1_single_note_round_trips() {
        let rep = build_default_representation().unwrap();
        let mut piece = Piece::new(12, 120.0);
        let mut track = ModelTrack::new(ModelTrackType::Standard, 0);
        let mut bar = ModelBar::new(4, 4);
        let onset = piece.push_event(ModelEvent { internal_duration: 12, ..ModelEvent::new(0, 60, 100, 0) });
        let offset = piece.push_event(ModelEvent::new(12, 60, 0, 0));
        bar.events.extend([onset, offset]);
        track.bars.push(bar);
        piece.tracks.push(track);

        let seq = encode_piece(&piece, &rep, &BTreeSet::new()).unwrap();
        let decoded = decode(&seq, &rep, 12, 120.0).unwrap();

        assert_eq!(decoded.tracks.len(), 1);
        let events = &decoded.tracks[0].bars[0].events;
        assert_eq!(events.len(), 2);
        assert_eq!(decoded.events[events[0]].time, 0);
        assert_eq!(decoded.events[events[0]].pitch, 60);
        assert_eq!(decoded.events[events[1]].time, 12);
    }

    #[test]
    fn s2_drum_onset_synthesizes_offset_at_time_plus_one() {
        let rep = build_default_representation().unwrap();
        let mut piece = Piece::new(12, 120.0);
        let mut track = ModelTrack::new(ModelTrackType::StandardDrum, 0);
        let mut bar = ModelBar::new(4, 4);
        let onset = piece.push_event(ModelEvent { internal_duration: 1, ..ModelEvent::new(0, 36, 100, 0) });
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        let seq = encode_piece(&piece, &rep, &BTreeSet::new()).unwrap();
        let decoded = decode(&seq, &rep, 12, 120.0).unwrap();
        let events: Vec<_> = decoded.tracks[0].bars[0].events.iter().map(|&i| decoded.events[i]).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].time, 0);
        assert_eq!(events[1].time, 1);
        assert_eq!(events[1].velocity, 0);
    }
}
