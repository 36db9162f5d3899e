//! core/tok-controls/src/evaluate.rs
//! Optional post-hoc scoring: how well a generated track matched its
//! requested attribute range (§4.3 `evaluate`).

use tok_model::{StatusTrack, Track, TrackFeatures};

/// Fraction of a `[min, max]` range that `value` satisfies: `1.0` when
/// inside the range (or the range is unset), `0.0` otherwise. Shared by the
/// controls with a plain min/max `Status` constraint.
fn range_hit(value: Option<u8>, lo: Option<u8>, hi: Option<u8>) -> f32 {
    let (Some(value), true) = (value, lo.is_some() || hi.is_some()) else { return 1.0 };
    let above_lo = lo.is_none_or(|lo| value >= lo);
    let below_hi = hi.is_none_or(|hi| value <= hi);
    f32::from(u8::from(above_lo && below_hi))
}

/// `TrackLevelOnsetDensity::evaluate_track_feature`: the original source
/// uses only `range_min` and returns `|value - range_min|`, not an
/// in-range fraction over both bounds — confirmed an oversight and kept
/// as-is (§9 open question 3).
#[must_use]
pub fn evaluate_onset_density(features: &TrackFeatures, status: &StatusTrack) -> f32 {
    let Some(range_min) = status.min_polyphony else { return 1.0 };
    let Some(value) = features.min_density else { return 1.0 };
    f32::from(value.abs_diff(range_min))
}

/// Fraction of the track's requested attribute constraints (polyphony
/// quantile, duration quantile, density) that the computed features satisfy.
/// Unconstrained attributes count as satisfied.
#[must_use]
pub fn evaluate_track(_track: &Track, features: &TrackFeatures, status: &StatusTrack) -> f32 {
    let hits = [
        range_hit(features.polyphony_quantile_min, status.min_polyphony, None),
        range_hit(features.polyphony_quantile_max, None, status.max_polyphony),
        range_hit(features.duration_quantile_min, status.min_duration, None),
        range_hit(features.duration_quantile_max, None, status.max_duration),
        range_hit(features.note_density_class, status.density, status.density),
    ];
    hits.iter().sum::<f32>() / hits.len() as f32
}

#[cfg(test)]
mod tests {
    use tok_model::TrackType;

    use super::*;

    fn status(min_polyphony: Option<u8>, max_polyphony: Option<u8>) -> StatusTrack {
        StatusTrack {
            selected_bars: vec![],
            autoregressive: false,
            ignore: false,
            polyphony_hard_limit: None,
            temperature: None,
            instrument: None,
            density: None,
            min_polyphony,
            max_polyphony,
            min_duration: None,
            max_duration: None,
            genre: None,
            bars: vec![],
        }
    }

    #[test]
    fn unconstrained_attributes_always_satisfied() {
        let track = Track::new(TrackType::Standard, 0);
        let features = TrackFeatures::default();
        let score = evaluate_track(&track, &features, &status(None, None));
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn in_range_polyphony_scores_full_credit() {
        let track = Track::new(TrackType::Standard, 0);
        let mut features = TrackFeatures::default();
        features.polyphony_quantile_min = Some(3);
        let score = evaluate_track(&track, &features, &status(Some(2), None));
        assert!(score > 0.9);
    }
}
