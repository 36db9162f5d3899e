//! core/tok-plan/src/plan.rs
//! Splits a selection matrix into autoregressive-then-infill generation
//! steps over bounded, overlapping context windows (§4.7 C8).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tok_model::HyperParam;

use crate::error::PlanError;
use crate::matrix::BoolMatrix;

/// Maps one locally-indexed generated bar back into the piece's global
/// `(track, bar)` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarMapping {
    /// Row index within this step's `step_matrix`/`context_matrix`.
    pub local_track: usize,
    /// Column index within this step's `step_matrix`/`context_matrix`.
    pub local_bar: usize,
    /// Track index in the original piece.
    pub global_track: usize,
    /// Bar index in the original piece.
    pub global_bar: usize,
}

/// One model invocation: a `model_dim`-bar window, which cells in it are
/// freshly generated versus conditioning context, and which global tracks
/// participate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// First global bar column covered by this step's window.
    pub start: usize,
    /// One past the last global bar column covered (`start + model_dim`).
    pub end: usize,
    /// `nt x model_dim` matrix of bars to generate in this step.
    pub step_matrix: BoolMatrix,
    /// `nt x model_dim` matrix of bars available as conditioning context.
    pub context_matrix: BoolMatrix,
    /// Global track indices appearing in `step_matrix` or `context_matrix`.
    pub tracks: Vec<usize>,
    /// Local-to-global bar coordinate mapping for every generated cell.
    pub bar_mapping: Vec<BarMapping>,
}

/// Builds the ordered step list for `selection`/`resample`/`ignore` under
/// `hyperparam` (§4.7). Runs the autoregressive pass over `selection &
/// resample`, then the infill pass over `selection & !resample`, failing
/// with [`PlanError::CoverageIncomplete`] if either selected region is not
/// fully covered afterwards.
pub fn plan(
    selection: &BoolMatrix,
    resample: &[bool],
    ignore: &[bool],
    hyperparam: &HyperParam,
) -> Result<Vec<Step>, PlanError> {
    let nt = selection.rows();
    let nb = selection.cols();
    if resample.len() != nt || ignore.len() != nt {
        return Err(PlanError::ShapeMismatch { selection_rows: nt, vector_len: resample.len().max(ignore.len()) });
    }
    let model_dim = hyperparam.model_dim;
    if model_dim == 0 || model_dim > nb {
        return Err(PlanError::WindowTooLarge { model_dim, bar_count: nb });
    }
    let tracks_per_step = hyperparam.tracks_per_step.max(1);
    let bars_per_step = hyperparam.bars_per_step.max(1);

    let resample_mat = BoolMatrix::broadcast_rows(resample, nb);
    let ignore_mat = BoolMatrix::broadcast_rows(ignore, nb);
    let autoregressive_domain = selection.and(&resample_mat);
    let infill_domain = selection.and(&resample_mat.not());
    let h = selection.any_along_rows();

    let mut covered = BoolMatrix::new(nt, nb, false);
    let mut steps = Vec::new();

    run_pass(
        &autoregressive_domain,
        &ignore_mat,
        &h,
        nt,
        nb,
        tracks_per_step,
        bars_per_step,
        model_dim,
        false,
        &mut covered,
        &mut steps,
    );
    let infill_start = steps.len();
    run_pass(
        &infill_domain,
        &ignore_mat,
        &h,
        nt,
        nb,
        tracks_per_step,
        bars_per_step,
        model_dim,
        true,
        &mut covered,
        &mut steps,
    );

    let mut infill_steps = steps.split_off(infill_start);
    if hyperparam.shuffle && infill_steps.len() > 1 {
        let mut rng = hyperparam
            .sampling_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        infill_steps.shuffle(&mut rng);
    }
    let keep = infill_steps.len() * usize::from(hyperparam.percentage.min(100)) / 100;
    infill_steps.truncate(keep);
    steps.extend(infill_steps);

    let uncovered = (0..nt)
        .flat_map(|r| (0..nb).map(move |c| (r, c)))
        .filter(|&(r, c)| selection.get(r, c) && !covered.get(r, c))
        .count();
    if uncovered > 0 {
        if hyperparam.verbosity.logs_boundaries() {
            tracing::warn!(uncovered, "selection not fully covered by planned steps");
        }
        return Err(PlanError::CoverageIncomplete { uncovered });
    }

    if hyperparam.verbosity.logs_boundaries() {
        tracing::debug!(
            autoregressive_steps = infill_start,
            infill_steps = steps.len() - infill_start,
            "plan complete"
        );
    }
    Ok(steps)
}

#[allow(clippy::too_many_arguments)]
fn run_pass(
    domain: &BoolMatrix,
    ignore_mat: &BoolMatrix,
    h: &[bool],
    nt: usize,
    nb: usize,
    tracks_per_step: usize,
    bars_per_step: usize,
    model_dim: usize,
    centered: bool,
    covered: &mut BoolMatrix,
    steps: &mut Vec<Step>,
) {
    let mut row_start = 0;
    while row_start < nt {
        let row_end = (row_start + tracks_per_step).min(nt);
        let mut col_start = 0;
        let mut first_block = true;
        while col_start < nb {
            let col_end = (col_start + bars_per_step).min(nb);
            let block_selected = (row_start..row_end)
                .any(|r| (col_start..col_end).any(|c| domain.get(r, c)));
            if !block_selected {
                col_start += bars_per_step;
                first_block = false;
                continue;
            }

            let t = if centered {
                let half = (model_dim - bars_per_step.min(model_dim)) / 2;
                col_start.saturating_sub(half).min(nb.saturating_sub(model_dim))
            } else {
                col_start.min(nb.saturating_sub(model_dim))
            };
            let window_end = t + model_dim;

            let fresh_start = if first_block && !centered { t } else { window_end.saturating_sub(bars_per_step) };

            let mut step_matrix = BoolMatrix::new(nt, model_dim, false);
            for r in row_start..row_end {
                for c in t..window_end {
                    let is_fresh = c >= fresh_start;
                    if is_fresh && domain.get(r, c) && !covered.get(r, c) {
                        step_matrix.set(r, c - t, true);
                    }
                }
            }

            if !step_matrix.any() {
                col_start += bars_per_step;
                first_block = false;
                continue;
            }

            let mut context_matrix = BoolMatrix::new(nt, model_dim, false);
            for r in 0..nt {
                for c in t..window_end {
                    let local_c = c - t;
                    if step_matrix.get(r, local_c) || ignore_mat.get(r, c) {
                        continue;
                    }
                    let available = if h[r] { covered.get(r, c) } else { true };
                    if available {
                        context_matrix.set(r, local_c, true);
                    }
                }
            }

            for r in row_start..row_end {
                for c in t..window_end {
                    if step_matrix.get(r, c - t) {
                        covered.set(r, c, true);
                    }
                }
            }

            let mut tracks: Vec<usize> = (0..nt)
                .filter(|&r| (0..model_dim).any(|c| step_matrix.get(r, c) || context_matrix.get(r, c)))
                .collect();
            tracks.sort_unstable();

            let mut bar_mapping = Vec::new();
            for r in 0..nt {
                for c in 0..model_dim {
                    if step_matrix.get(r, c) {
                        bar_mapping.push(BarMapping { local_track: r, local_bar: c, global_track: r, global_bar: t + c });
                    }
                }
            }

            steps.push(Step { start: t, end: window_end, step_matrix, context_matrix, tracks, bar_mapping });

            col_start += bars_per_step;
            first_block = false;
        }
        row_start += tracks_per_step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp(model_dim: usize, tracks_per_step: usize, bars_per_step: usize) -> HyperParam {
        HyperParam { model_dim, tracks_per_step, bars_per_step, ..HyperParam::default() }
    }

    #[test]
    fn window_too_large_when_model_dim_exceeds_bar_count() {
        let selection = BoolMatrix::new(1, 2, true);
        let err = plan(&selection, &[true], &[false], &hp(4, 1, 1)).unwrap_err();
        assert_eq!(err, PlanError::WindowTooLarge { model_dim: 4, bar_count: 2 });
    }

    #[test]
    fn fully_resampled_single_track_covers_every_selected_bar() {
        let selection = BoolMatrix::new(1, 8, true);
        let steps = plan(&selection, &[true], &[false], &hp(4, 1, 2)).unwrap();
        assert!(!steps.is_empty());
        let mut covered = BoolMatrix::new(1, 8, false);
        for step in &steps {
            for mapping in &step.bar_mapping {
                covered.set(mapping.global_track, mapping.global_bar, true);
            }
        }
        assert!(covered.all());
    }

    #[test]
    fn autoregressive_steps_stay_inside_selection_and_resample() {
        let mut selection = BoolMatrix::new(2, 8, false);
        selection.set_range(0, 1, 0, 8, true);
        selection.set_range(1, 2, 2, 5, true);
        let resample = [true, false];
        let ignore = [false, false];
        let steps = plan(&selection, &resample, &ignore, &hp(4, 1, 2)).unwrap();
        for step in &steps {
            for mapping in &step.bar_mapping {
                if mapping.global_track == 0 {
                    assert!(selection.get(0, mapping.global_bar));
                }
            }
        }
    }

    #[test]
    fn infill_only_touches_unresampled_selected_bars() {
        let mut selection = BoolMatrix::new(2, 8, false);
        selection.set_range(0, 1, 0, 8, true);
        selection.set_range(1, 2, 2, 5, true);
        let resample = [true, false];
        let ignore = [false, false];
        let steps = plan(&selection, &resample, &ignore, &hp(4, 1, 2)).unwrap();
        let mut track1_covered = BoolMatrix::new(1, 8, false);
        for step in &steps {
            for mapping in &step.bar_mapping {
                if mapping.global_track == 1 {
                    track1_covered.set(0, mapping.global_bar, true);
                }
            }
        }
        for c in 2..5 {
            assert!(track1_covered.get(0, c));
        }
        for c in [0, 1, 5, 6, 7] {
            assert!(!track1_covered.get(0, c));
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let selection = BoolMatrix::new(2, 4, true);
        let err = plan(&selection, &[true], &[false, false], &hp(4, 1, 1)).unwrap_err();
        assert_eq!(err, PlanError::ShapeMismatch { selection_rows: 2, vector_len: 2 });
    }
}
