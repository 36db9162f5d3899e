//! core/tok-controls/src/mask.rs
//! Unmasks exactly the user-requested value for each control token, or the
//! whole domain when the request is unset (§4.3 `set_mask`/`override_features`).

use tok_model::{BarFeatures, StatusBar, StatusTrack, TrackFeatures};
use tok_vocab::{Representation, TokenType};

use crate::control::{bar_controls, track_controls, AttributeControl};

const UNMASK_ALL: &[i32] = &[-1];

fn unmask_value_or_all(rep: &Representation, tt: TokenType, value: Option<u8>, mask: &mut [i32]) {
    match value {
        Some(v) => rep.set_mask(tt, &[i32::from(v)], mask, 1),
        None => rep.set_mask(tt, UNMASK_ALL, mask, 1),
    }
}

/// Unmasks every `TRACK`-level control's tokens against `status`: the
/// requested value when the corresponding `Status` field is set, the whole
/// domain otherwise. Controls with no direct `Status` override
/// (`TrackLevelOnsetPolyphony`, `TrackLevelOnsetDensity`,
/// `TrackLevelNoteDuration`, `PitchRange`) always unmask their whole domain.
pub fn set_track_masks(rep: &Representation, mask: &mut [i32], status: &StatusTrack) {
    for control in track_controls() {
        match control {
            AttributeControl::PolyphonyQuantile => {
                unmask_value_or_all(rep, TokenType::MinPolyphony, status.min_polyphony, mask);
                unmask_value_or_all(rep, TokenType::MaxPolyphony, status.max_polyphony, mask);
            }
            AttributeControl::NoteDurationQuantile => {
                unmask_value_or_all(rep, TokenType::MinNoteDuration, status.min_duration, mask);
                unmask_value_or_all(rep, TokenType::MaxNoteDuration, status.max_duration, mask);
            }
            AttributeControl::NoteDensity => {
                unmask_value_or_all(rep, TokenType::DensityLevel, status.density, mask);
            }
            AttributeControl::TrackLevelOnsetPolyphony => {
                rep.set_mask(TokenType::TrackMinOnsetPolyphony, UNMASK_ALL, mask, 1);
                rep.set_mask(TokenType::TrackMaxOnsetPolyphony, UNMASK_ALL, mask, 1);
            }
            AttributeControl::TrackLevelOnsetDensity => {
                rep.set_mask(TokenType::TrackMinOnsetDensity, UNMASK_ALL, mask, 1);
                rep.set_mask(TokenType::TrackMaxOnsetDensity, UNMASK_ALL, mask, 1);
            }
            AttributeControl::TrackLevelNoteDuration => {
                for (tt, _) in control.tokens() {
                    rep.set_mask(*tt, UNMASK_ALL, mask, 1);
                }
            }
            AttributeControl::PitchRange => {
                rep.set_mask(TokenType::TrackMinPitch, UNMASK_ALL, mask, 1);
                rep.set_mask(TokenType::TrackMaxPitch, UNMASK_ALL, mask, 1);
            }
            AttributeControl::Genre
            | AttributeControl::BarLevelOnsetPolyphony
            | AttributeControl::BarLevelOnsetDensity => {}
        }
    }

    if rep.has_token_type(TokenType::Genre) {
        match status.genre.as_deref() {
            Some(genre) => {
                if let Ok(id) = rep.encode(TokenType::Genre, genre) {
                    mask[id as usize] = 1;
                }
            }
            None => rep.set_mask(TokenType::Genre, UNMASK_ALL, mask, 1),
        }
    }
}

/// Unmasks every `BAR`-level control's tokens against a [`StatusBar`]'s
/// per-bar overrides.
pub fn set_bar_masks(rep: &Representation, mask: &mut [i32], status: &StatusBar) {
    for control in bar_controls() {
        match control {
            AttributeControl::BarLevelOnsetPolyphony => {
                unmask_value_or_all(rep, TokenType::BarMinOnsetPolyphony, status.min_polyphony, mask);
                unmask_value_or_all(rep, TokenType::BarMaxOnsetPolyphony, status.max_polyphony, mask);
            }
            AttributeControl::BarLevelOnsetDensity => {
                unmask_value_or_all(rep, TokenType::BarOnsetDensity, status.onset_density, mask);
            }
            _ => {}
        }
    }
}

/// Overwrites computed [`TrackFeatures`] fields with the user's explicit
/// `Status` request, where one was supplied.
pub fn override_track_features(features: &mut TrackFeatures, status: &StatusTrack) {
    if let Some(v) = status.min_polyphony {
        features.polyphony_quantile_min = Some(v);
    }
    if let Some(v) = status.max_polyphony {
        features.polyphony_quantile_max = Some(v);
    }
    if let Some(v) = status.min_duration {
        features.duration_quantile_min = Some(v);
    }
    if let Some(v) = status.max_duration {
        features.duration_quantile_max = Some(v);
    }
    if let Some(v) = status.density {
        features.note_density_class = Some(v);
    }
}

/// Overwrites computed [`BarFeatures`] fields with the user's explicit
/// per-bar `Status` request.
pub fn override_bar_features(features: &mut BarFeatures, status: &StatusBar) {
    if let Some(v) = status.min_polyphony {
        features.min_polyphony = Some(v);
    }
    if let Some(v) = status.max_polyphony {
        features.max_polyphony = Some(v);
    }
    if let Some(v) = status.onset_density {
        features.onset_density = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use tok_model::StatusTrack;
    use tok_vocab::build_default_representation;

    use super::*;

    fn status_track() -> StatusTrack {
        StatusTrack {
            selected_bars: vec![],
            autoregressive: false,
            ignore: false,
            polyphony_hard_limit: None,
            temperature: None,
            instrument: None,
            density: None,
            min_polyphony: None,
            max_polyphony: None,
            min_duration: None,
            max_duration: None,
            genre: None,
            bars: vec![],
        }
    }

    #[test]
    fn unset_density_unmasks_whole_domain() {
        let rep = build_default_representation().unwrap();
        let mut mask = rep.mask_of(0i32);
        set_track_masks(&rep, &mut mask, &status_track());
        for v in 0..10i64 {
            let id = rep.encode(TokenType::DensityLevel, v).unwrap();
            assert_eq!(mask[id as usize], 1);
        }
    }

    #[test]
    fn set_density_unmasks_only_requested_class() {
        let rep = build_default_representation().unwrap();
        let mut mask = rep.mask_of(0i32);
        let mut status = status_track();
        status.density = Some(3);
        set_track_masks(&rep, &mut mask, &status);
        for v in 0..10i64 {
            let id = rep.encode(TokenType::DensityLevel, v).unwrap();
            assert_eq!(mask[id as usize], i32::from(v == 3));
        }
    }

    #[test]
    fn genre_constraint_unmasks_single_value() {
        let rep = build_default_representation().unwrap();
        let mut mask = rep.mask_of(0i32);
        let mut status = status_track();
        status.genre = Some("jazz".to_string());
        set_track_masks(&rep, &mut mask, &status);
        let jazz_id = rep.encode(TokenType::Genre, "jazz").unwrap();
        let rock_id = rep.encode(TokenType::Genre, "rock").unwrap();
        assert_eq!(mask[jazz_id as usize], 1);
        assert_eq!(mask[rock_id as usize], 0);
    }
}
