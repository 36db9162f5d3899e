//! core/tok-codec/src/encode.rs
//! Flattens a preprocessed [`Piece`] into a token sequence (§4.4 "Encode
//! piece").

use std::collections::BTreeSet;

use tok_controls::{append_bar_tokens, append_track_pre_instrument_tokens, append_track_tokens};
use tok_model::{Piece, TrackFeatures};
use tok_vocab::{Representation, TokenType};

use crate::error::CodecError;

#[derive(Default)]
struct TrackEncodeState {
    last_velocity: Option<u8>,
}

/// Encodes `piece`, treating every `(track, bar)` in `multi_fill` as a
/// fill-in target: its notes are replaced by a `FILL_IN_PLACEHOLDER` in
/// structural position and re-emitted in a trailing
/// `FILL_IN_START...FILL_IN_END` block, in ascending `(track, bar)` order.
pub fn encode_piece(
    piece: &Piece,
    rep: &Representation,
    multi_fill: &BTreeSet<(usize, usize)>,
) -> Result<Vec<u32>, CodecError> {
    let mut seq = Vec::new();
    seq.push(rep.encode(TokenType::PieceStart, 0i64)?);
    if rep.has_token_type(TokenType::NumBars) {
        seq.push(rep.encode(TokenType::NumBars, piece.bar_count() as i64)?);
    }

    for (track_idx, track) in piece.tracks.iter().enumerate() {
        seq.push(rep.encode(TokenType::Track, i64::from(track.is_drum()))?);
        append_track_pre_instrument_tokens(&mut seq, rep, piece.features.as_ref())?;
        if rep.has_token_type(TokenType::Instrument) {
            seq.push(rep.encode(TokenType::Instrument, i64::from(track.instrument))?);
        }
        append_track_tokens(&mut seq, rep, track.features.as_ref().unwrap_or(&TrackFeatures::default()))?;

        let mut state = TrackEncodeState::default();
        for (bar_idx, bar) in track.bars.iter().enumerate() {
            seq.push(rep.encode(TokenType::Bar, 0i64)?);
            append_bar_tokens(&mut seq, rep, bar.features.as_ref().unwrap_or(&Default::default()))?;
            if rep.has_token_type(TokenType::TimeSignature) {
                seq.push(rep.encode(TokenType::TimeSignature, (bar.ts_numerator, bar.ts_denominator))?);
            }
            if multi_fill.contains(&(track_idx, bar_idx)) {
                seq.push(rep.encode(TokenType::FillInPlaceholder, 0i64)?);
            } else {
                encode_notes(piece, track_idx, bar_idx, rep, &mut state, &mut seq)?;
            }
            seq.push(rep.encode(TokenType::BarEnd, 0i64)?);
        }
        seq.push(rep.encode(TokenType::TrackEnd, 0i64)?);
    }

    if !multi_fill.is_empty() {
        for &(track_idx, bar_idx) in multi_fill {
            let track = &piece.tracks[track_idx];
            let bar = &track.bars[bar_idx];
            seq.push(rep.encode(TokenType::Bar, 0i64)?);
            append_bar_tokens(&mut seq, rep, bar.features.as_ref().unwrap_or(&Default::default()))?;
            if rep.has_token_type(TokenType::TimeSignature) {
                seq.push(rep.encode(TokenType::TimeSignature, (bar.ts_numerator, bar.ts_denominator))?);
            }
            seq.push(rep.encode(TokenType::FillInStart, 0i64)?);
            let mut state = TrackEncodeState::default();
            encode_notes(piece, track_idx, bar_idx, rep, &mut state, &mut seq)?;
            seq.push(rep.encode(TokenType::FillInEnd, 0i64)?);
        }
    }

    Ok(seq)
}

/// Groups onset events in `(track, bar)` by time and emits them in
/// ascending time (then pitch) order (§4.4 "encode_notes").
fn encode_notes(
    piece: &Piece,
    track_idx: usize,
    bar_idx: usize,
    rep: &Representation,
    state: &mut TrackEncodeState,
    seq: &mut Vec<u32>,
) -> Result<(), CodecError> {
    let track = &piece.tracks[track_idx];
    let bar = &track.bars[bar_idx];
    let is_drum = track.is_drum();

    let mut by_time: std::collections::BTreeMap<u32, Vec<usize>> = std::collections::BTreeMap::new();
    for &idx in &bar.events {
        let ev = piece.events[idx];
        // An onset whose matching offset preprocessing never found keeps
        // internal_duration == 0; such a note was never really sounded and
        // is dropped rather than encoded as a fabricated 1-tick note.
        if ev.is_onset() && ev.internal_duration > 0 {
            by_time.entry(ev.time).or_default().push(idx);
        }
    }
    for idxs in by_time.values_mut() {
        idxs.sort_by_key(|&idx| piece.events[idx].pitch);
    }

    for (&time, idxs) in &by_time {
        // legacy rule: onset == 0 never gets an explicit TIME_ABSOLUTE_POS
        if time != 0 && rep.has_token_type(TokenType::TimeAbsolutePos) {
            seq.push(rep.encode(TokenType::TimeAbsolutePos, i64::from(time))?);
        }
        for &idx in idxs {
            let ev = piece.events[idx];
            if rep.has_token_type(TokenType::VelocityLevel) && state.last_velocity != Some(ev.velocity) {
                seq.push(rep.encode(TokenType::VelocityLevel, i64::from(ev.velocity))?);
                state.last_velocity = Some(ev.velocity);
            }
            if rep.has_token_type(TokenType::Delta) && ev.delta != 0 {
                if ev.delta < 0 && rep.has_token_type(TokenType::DeltaDirection) {
                    seq.push(rep.encode(TokenType::DeltaDirection, 0i64)?);
                }
                let domain = rep.domain_size(TokenType::Delta).max(1);
                let magnitude = ev.delta.unsigned_abs().min(domain - 1);
                seq.push(rep.encode(TokenType::Delta, i64::from(magnitude))?);
            }
            seq.push(rep.encode(TokenType::NoteOnset, i64::from(ev.pitch))?);
            if !is_drum && rep.has_token_type(TokenType::NoteDuration) {
                let domain = rep.domain_size(TokenType::NoteDuration).max(1);
                let value = ev.internal_duration.min(domain).saturating_sub(1);
                seq.push(rep.encode(TokenType::NoteDuration, i64::from(value))?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tok_model::{Bar, Event, Track, TrackType};
    use tok_vocab::build_default_representation;

    use super::*;

    #[test]
    fn s1_single_note_round_trips_structurally() {
        let rep = build_default_representation().unwrap();
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: 12, ..Event::new(0, 60, 100, 0) });
        let offset = piece.push_event(Event::new(12, 60, 0, 0));
        bar.events.extend([onset, offset]);
        track.bars.push(bar);
        piece.tracks.push(track);

        let seq = encode_piece(&piece, &rep, &BTreeSet::new()).unwrap();
        let types: Vec<TokenType> = seq.iter().map(|&id| rep.token_type_of(id).unwrap()).collect();
        assert_eq!(types.first(), Some(&TokenType::PieceStart));
        assert!(types.contains(&TokenType::NoteOnset));
        assert!(types.contains(&TokenType::NoteDuration));
        assert_eq!(types.last(), Some(&TokenType::TrackEnd));
    }

    #[test]
    fn s2_drum_onset_has_no_duration_token() {
        let rep = build_default_representation().unwrap();
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::StandardDrum, 0);
        let mut bar = Bar::new(4, 4);
        let onset = piece.push_event(Event { internal_duration: 1, ..Event::new(0, 36, 100, 0) });
        bar.events.push(onset);
        track.bars.push(bar);
        piece.tracks.push(track);

        let seq = encode_piece(&piece, &rep, &BTreeSet::new()).unwrap();
        let types: Vec<TokenType> = seq.iter().map(|&id| rep.token_type_of(id).unwrap()).collect();
        assert!(!types.contains(&TokenType::NoteDuration));
    }
}
