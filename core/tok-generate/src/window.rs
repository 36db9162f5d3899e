//! core/tok-generate/src/window.rs
//! Subsets a piece/status pair to one planner [`Step`]'s bar window, and
//! splices a generated window back into the original piece afterward
//! (§4.7 dataflow: "subset piece ... insert generated bars back").

use std::collections::BTreeSet;

use tok_grammar::ModelMode;
use tok_model::{Piece, SelectionClass, Status, StatusBar, StatusTrack, Track};
use tok_plan::Step;

/// One step's bar range, copied out of the master piece with target bars
/// either stripped (autoregressive resample) or left in place for
/// placeholder substitution ([`tok_codec::encode_piece`]'s `multi_fill`,
/// bar-infill tracks).
pub struct Window {
    /// The subsetted piece, bars `0..model_dim` mapping to the step's
    /// `[start, end)` global bar range.
    pub piece: Piece,
    /// The subsetted status, one `StatusTrack` per track in `piece`, aligned
    /// by the same (global) track index.
    pub status: Status,
    /// `(track, local_bar)` cells to encode as fill-in placeholders.
    pub multi_fill: BTreeSet<(usize, usize)>,
    /// Grammar mode this window's generation should run under.
    pub mode: ModelMode,
}

fn blank_status_track(bars: usize) -> StatusTrack {
    StatusTrack {
        selected_bars: vec![false; bars],
        autoregressive: false,
        ignore: true,
        polyphony_hard_limit: None,
        temperature: None,
        instrument: None,
        density: None,
        min_polyphony: None,
        max_polyphony: None,
        min_duration: None,
        max_duration: None,
        genre: None,
        bars: vec![StatusBar::default(); bars],
    }
}

/// Builds the window a [`Step`] describes. `step.step_matrix` and
/// `step.context_matrix` are indexed by the *global* track row (plan.rs
/// never remaps tracks to a local 0-based range), so this walks every track
/// in `piece`, not just `step.tracks`.
#[must_use]
pub fn extract_window(piece: &Piece, status: &Status, step: &Step) -> Window {
    let model_dim = step.end - step.start;
    let nt = piece.tracks.len();
    let mut any_infill = false;
    let mut out_tracks = Vec::with_capacity(nt);
    let mut out_status_tracks = Vec::with_capacity(nt);
    let mut multi_fill = BTreeSet::new();

    for global_track in 0..nt {
        let src_track = &piece.tracks[global_track];
        let bar_count = piece.bar_count();
        let src_status =
            status.tracks.get(global_track).cloned().unwrap_or_else(|| blank_status_track(bar_count));
        let class = src_status.classify();
        if step.tracks.contains(&global_track) && class == SelectionClass::Infill {
            any_infill = true;
        }

        let mut bars = Vec::with_capacity(model_dim);
        let mut selected_bars = Vec::with_capacity(model_dim);
        let mut status_bars = Vec::with_capacity(model_dim);
        for local_bar in 0..model_dim {
            let global_bar = step.start + local_bar;
            let mut bar = src_track.bars[global_bar].clone();
            let is_target = step.step_matrix.get(global_track, local_bar);
            selected_bars.push(is_target);
            if is_target {
                match class {
                    SelectionClass::Resample => bar.events.clear(),
                    SelectionClass::Infill => {
                        multi_fill.insert((global_track, local_bar));
                    }
                    SelectionClass::Condition => {}
                }
            }
            bars.push(bar);
            status_bars.push(src_status.bars.get(global_bar).cloned().unwrap_or_default());
        }

        out_tracks.push(Track {
            track_type: src_track.track_type,
            instrument: src_track.instrument,
            bars,
            features: None,
        });
        out_status_tracks.push(StatusTrack { selected_bars, bars: status_bars, ..src_status });
    }

    let mut window_piece =
        Piece { resolution: piece.resolution, tempo: piece.tempo, tracks: out_tracks, events: Vec::new(), features: piece.features.clone() };
    remap_events(piece, &mut window_piece);

    let mode = if any_infill { ModelMode::BarInfill } else { ModelMode::Track };
    Window { piece: window_piece, status: Status { tracks: out_status_tracks }, multi_fill, mode }
}

/// Every bar event index in a freshly-sliced piece still points into the
/// *source* piece's flat event pool. Rebuilds a compact pool local to `dst`
/// and rewrites every bar's indices to match.
fn remap_events(src: &Piece, dst: &mut Piece) {
    for track in &mut dst.tracks {
        for bar in &mut track.bars {
            let mut remapped: smallvec::SmallVec<[usize; 8]> = smallvec::SmallVec::new();
            for &old_idx in &bar.events {
                let new_idx = dst.events.len();
                dst.events.push(src.events[old_idx]);
                remapped.push(new_idx);
            }
            bar.events = remapped;
        }
    }
}

/// Replaces every bar the step generated with its counterpart decoded from
/// `generated` (indexed the same way `extract_window` built it: bar-mapping
/// rows are global track indices, columns are window-local bar indices),
/// appending each bar's events to the master piece's flat pool via
/// [`Piece::push_event`]. A mapping whose target is out of range in
/// `generated` (the sampler stopped early, e.g. `max_steps` exhaustion) is
/// skipped rather than panicking, leaving that bar as it was.
pub fn splice_back(piece: &mut Piece, generated: &Piece, step: &Step) {
    for mapping in &step.bar_mapping {
        let Some(new_bar) = generated
            .tracks
            .get(mapping.local_track)
            .and_then(|t| t.bars.get(mapping.local_bar))
            .cloned()
        else {
            continue;
        };
        piece.tracks[mapping.global_track].bars[mapping.global_bar] =
            tok_model::Bar::new(new_bar.ts_numerator, new_bar.ts_denominator);
        piece.tracks[mapping.global_track].bars[mapping.global_bar].features = new_bar.features;
        for &event_idx in &new_bar.events {
            let event = generated.events[event_idx];
            let idx = piece.push_event(event);
            piece.tracks[mapping.global_track].bars[mapping.global_bar].events.push(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use tok_model::{Bar, Event, HyperParam, TrackType};
    use tok_plan::BoolMatrix;

    use super::*;

    fn two_bar_piece() -> Piece {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        track.bars.push(Bar::new(4, 4));
        track.bars.push(Bar::new(4, 4));
        piece.tracks.push(track);
        let onset = piece.push_event(Event::new(0, 60, 100, 0));
        let offset = piece.push_event(Event::new(12, 60, 0, 0));
        piece.tracks[0].bars[0].events.push(onset);
        piece.tracks[0].bars[0].events.push(offset);
        piece
    }

    fn full_status(bars: usize, autoregressive: bool) -> Status {
        let mut track = blank_status_track(bars);
        track.ignore = false;
        track.autoregressive = autoregressive;
        track.selected_bars = vec![true; bars];
        Status { tracks: vec![track] }
    }

    #[test]
    fn resample_track_strips_target_bar_events() {
        let piece = two_bar_piece();
        let status = full_status(2, true);
        let mut step_matrix = BoolMatrix::new(1, 2, false);
        step_matrix.set(0, 0, true);
        step_matrix.set(0, 1, true);
        let context_matrix = BoolMatrix::new(1, 2, false);
        let step = Step {
            start: 0,
            end: 2,
            step_matrix,
            context_matrix,
            tracks: vec![0],
            bar_mapping: vec![],
        };
        let window = extract_window(&piece, &status, &step);
        assert!(window.piece.tracks[0].bars[0].events.is_empty());
        assert_eq!(window.mode, ModelMode::Track);
    }

    #[test]
    fn partial_selection_is_classified_as_infill_and_keeps_notes() {
        let piece = two_bar_piece();
        let mut status_track = blank_status_track(2);
        status_track.ignore = false;
        status_track.selected_bars = vec![false, true];
        let status = Status { tracks: vec![status_track] };
        let mut step_matrix = BoolMatrix::new(1, 2, false);
        step_matrix.set(0, 1, true);
        let context_matrix = BoolMatrix::new(1, 2, false);
        let step = Step {
            start: 0,
            end: 2,
            step_matrix,
            context_matrix,
            tracks: vec![0],
            bar_mapping: vec![],
        };
        let window = extract_window(&piece, &status, &step);
        assert_eq!(window.mode, ModelMode::BarInfill);
        assert!(window.multi_fill.contains(&(0, 1)));
        assert!(!window.piece.tracks[0].bars[0].events.is_empty());
    }

    #[test]
    fn hyperparam_default_window_is_nonempty() {
        let hp = HyperParam::default();
        assert!(hp.model_dim > 0);
    }
}
