//! core/tok-controls/src/tokens.rs
//! Appends each level's conditioning tokens to a token-id stream, in
//! registry order, so token emission and the grammar's generated edges
//! (`tok-grammar`) stay in lockstep (§4.3/§4.5).

use tok_model::{BarFeatures, PieceFeatures, TrackFeatures};
use tok_vocab::{Representation, TokenType, VocabError};

use crate::control::{bar_controls, track_controls, track_pre_instrument_controls, AttributeControl};

fn push(seq: &mut Vec<u32>, rep: &Representation, tt: TokenType, value: i64) -> Result<(), VocabError> {
    if rep.has_token_type(tt) {
        seq.push(rep.encode(tt, value)?);
    }
    Ok(())
}

/// Appends every `TRACK_PRE_INSTRUMENT`-level control's tokens (just
/// `Genre`, in the default registry), in registry order.
pub fn append_track_pre_instrument_tokens(
    seq: &mut Vec<u32>,
    rep: &Representation,
    piece_features: Option<&PieceFeatures>,
) -> Result<(), VocabError> {
    for control in track_pre_instrument_controls() {
        if let AttributeControl::Genre = control {
            if !rep.has_token_type(TokenType::Genre) {
                continue;
            }
            let genre = piece_features.and_then(|f| f.genre.as_deref()).unwrap_or("rock");
            seq.push(rep.encode(TokenType::Genre, genre)?);
        }
    }
    Ok(())
}

/// Appends every `TRACK`-level control's tokens, in registry order. Missing
/// feature values (an empty track) fall back to class `0` so the token
/// stream stays structurally deterministic.
pub fn append_track_tokens(
    seq: &mut Vec<u32>,
    rep: &Representation,
    features: &TrackFeatures,
) -> Result<(), VocabError> {
    for control in track_controls() {
        match control {
            AttributeControl::TrackLevelOnsetPolyphony => {
                push(seq, rep, TokenType::TrackMinOnsetPolyphony, i64::from(features.min_polyphony.unwrap_or(0)))?;
                push(seq, rep, TokenType::TrackMaxOnsetPolyphony, i64::from(features.max_polyphony.unwrap_or(0)))?;
            }
            AttributeControl::TrackLevelOnsetDensity => {
                push(seq, rep, TokenType::TrackMinOnsetDensity, i64::from(features.min_density.unwrap_or(0)))?;
                push(seq, rep, TokenType::TrackMaxOnsetDensity, i64::from(features.max_density.unwrap_or(0)))?;
            }
            AttributeControl::TrackLevelNoteDuration => {
                let classes = [
                    TokenType::NoteDurationClass0,
                    TokenType::NoteDurationClass1,
                    TokenType::NoteDurationClass2,
                    TokenType::NoteDurationClass3,
                    TokenType::NoteDurationClass4,
                    TokenType::NoteDurationClass5,
                ];
                for (idx, tt) in classes.into_iter().enumerate() {
                    push(seq, rep, tt, i64::from(features.note_duration_classes[idx]))?;
                }
            }
            AttributeControl::PolyphonyQuantile => {
                push(
                    seq,
                    rep,
                    TokenType::MinPolyphony,
                    i64::from(features.polyphony_quantile_min.unwrap_or(0)),
                )?;
                push(
                    seq,
                    rep,
                    TokenType::MaxPolyphony,
                    i64::from(features.polyphony_quantile_max.unwrap_or(0)),
                )?;
            }
            AttributeControl::NoteDurationQuantile => {
                push(seq, rep, TokenType::MinNoteDuration, i64::from(features.duration_quantile_min.unwrap_or(0)))?;
                push(seq, rep, TokenType::MaxNoteDuration, i64::from(features.duration_quantile_max.unwrap_or(0)))?;
            }
            AttributeControl::NoteDensity => {
                push(seq, rep, TokenType::DensityLevel, i64::from(features.note_density_class.unwrap_or(0)))?;
            }
            AttributeControl::PitchRange => {
                push(seq, rep, TokenType::TrackMinPitch, i64::from(features.pitch_min.unwrap_or(0)))?;
                push(seq, rep, TokenType::TrackMaxPitch, i64::from(features.pitch_max.unwrap_or(0)))?;
            }
            AttributeControl::Genre
            | AttributeControl::BarLevelOnsetPolyphony
            | AttributeControl::BarLevelOnsetDensity => {}
        }
    }
    Ok(())
}

/// Appends every `BAR`-level control's tokens, in registry order.
pub fn append_bar_tokens(seq: &mut Vec<u32>, rep: &Representation, features: &BarFeatures) -> Result<(), VocabError> {
    for control in bar_controls() {
        match control {
            AttributeControl::BarLevelOnsetPolyphony => {
                push(seq, rep, TokenType::BarMinOnsetPolyphony, i64::from(features.min_polyphony.unwrap_or(0)))?;
                push(seq, rep, TokenType::BarMaxOnsetPolyphony, i64::from(features.max_polyphony.unwrap_or(0)))?;
            }
            AttributeControl::BarLevelOnsetDensity => {
                push(seq, rep, TokenType::BarOnsetDensity, i64::from(features.onset_density.unwrap_or(0)))?;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tok_model::TrackFeatures;
    use tok_vocab::build_default_representation;

    use super::*;

    #[test]
    fn track_tokens_emitted_in_registry_order() {
        let rep = build_default_representation().unwrap();
        let mut seq = Vec::new();
        let features = TrackFeatures { min_polyphony: Some(2), max_polyphony: Some(4), ..TrackFeatures::default() };
        append_track_tokens(&mut seq, &rep, &features).unwrap();
        assert_eq!(rep.decode_int(seq[0]).unwrap(), 2);
        assert_eq!(rep.decode_int(seq[1]).unwrap(), 4);
    }

    #[test]
    fn genre_defaults_when_piece_features_absent() {
        let rep = build_default_representation().unwrap();
        let mut seq = Vec::new();
        append_track_pre_instrument_tokens(&mut seq, &rep, None).unwrap();
        assert_eq!(seq.len(), 1);
    }
}
