//! core/tok-grammar/src/base_spec.rs
//! The literal base-grammar path list (§6 "Grammar base edges") plus the
//! attribute-control chains generated from the C4 registry.

use tok_controls::{bar_controls, track_controls, track_pre_instrument_controls};
use tok_vocab::TokenType;

use crate::graph::Node;

fn n(tt: TokenType) -> Node {
    (tt, 0)
}

fn path(tts: &[TokenType]) -> Vec<Node> {
    tts.iter().copied().map(n).collect()
}

/// Every literal base-grammar path, each edge normative for the default
/// encoder. Conditional variants drop drum-exclusive or instrument-exclusive
/// nodes from the graph this builds (`Grammar::initialize`), they do not
/// change this list.
#[must_use]
pub fn def_graph() -> Vec<Vec<TokenType>> {
    use TokenType::{
        Bar, BarEnd, Delta, DeltaDirection, FillInEnd, FillInPlaceholder, FillInStart, Instrument, NoteDuration,
        NoteOnset, NumBars, PieceStart, TimeAbsolutePos, TimeSignature, Track, TrackEnd, VelocityLevel,
    };
    vec![
        vec![PieceStart, NumBars, Track],
        vec![TimeSignature, TimeAbsolutePos],
        vec![TimeSignature, VelocityLevel],
        vec![TimeSignature, FillInPlaceholder],
        vec![FillInPlaceholder, BarEnd],
        vec![VelocityLevel, NoteOnset],
        vec![VelocityLevel, Delta],
        vec![DeltaDirection, Delta],
        vec![Delta, Delta],
        vec![Delta, DeltaDirection],
        vec![Delta, NoteOnset],
        vec![Delta, FillInEnd],
        vec![NoteOnset, NoteDuration],
        vec![NoteDuration, TimeAbsolutePos],
        vec![NoteDuration, NoteOnset],
        vec![NoteDuration, VelocityLevel],
        vec![NoteDuration, BarEnd],
        vec![NoteDuration, FillInEnd],
        vec![TimeAbsolutePos, NoteOnset],
        vec![TimeAbsolutePos, VelocityLevel],
        vec![TimeAbsolutePos, BarEnd],
        vec![TimeAbsolutePos, FillInEnd],
        vec![TimeAbsolutePos, Delta],
        vec![TimeAbsolutePos, DeltaDirection],
        vec![NoteDuration, Delta],
        vec![NoteDuration, DeltaDirection],
        vec![DeltaDirection, Delta],
        vec![BarEnd, Bar],
        vec![BarEnd, TrackEnd],
        vec![TrackEnd, Track],
        vec![TrackEnd, FillInStart],
        vec![FillInStart, TimeAbsolutePos],
        vec![FillInStart, VelocityLevel],
        vec![FillInEnd, FillInStart],
        vec![Instrument, Bar],
        vec![FillInStart, FillInEnd],
    ]
}

/// `TRACK -> {track-pre-instrument tokens, in registry order} -> {track
/// tokens, in registry order} -> INSTRUMENT`. Both C4 levels are chained in
/// one path since they share the same position in the grammar (between the
/// `TRACK` and `INSTRUMENT` nodes).
#[must_use]
pub fn track_attribute_path() -> Vec<Node> {
    let mut tts = vec![TokenType::Track];
    for control in track_pre_instrument_controls() {
        tts.extend(control.tokens().iter().map(|(tt, _)| *tt));
    }
    for control in track_controls() {
        tts.extend(control.tokens().iter().map(|(tt, _)| *tt));
    }
    tts.push(TokenType::Instrument);
    path(&tts)
}

/// `BAR -> {bar tokens, in registry order} -> TIME_SIGNATURE`.
#[must_use]
pub fn bar_attribute_path() -> Vec<Node> {
    let mut tts = vec![TokenType::Bar];
    for control in bar_controls() {
        tts.extend(control.tokens().iter().map(|(tt, _)| *tt));
    }
    tts.push(TokenType::TimeSignature);
    path(&tts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_attribute_path_starts_and_ends_correctly() {
        let p = track_attribute_path();
        assert_eq!(p.first().unwrap().0, TokenType::Track);
        assert_eq!(p.last().unwrap().0, TokenType::Instrument);
        assert!(p.len() > 2);
    }

    #[test]
    fn bar_attribute_path_starts_and_ends_correctly() {
        let p = bar_attribute_path();
        assert_eq!(p.first().unwrap().0, TokenType::Bar);
        assert_eq!(p.last().unwrap().0, TokenType::TimeSignature);
    }
}
