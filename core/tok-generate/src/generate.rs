//! core/tok-generate/src/generate.rs
//! The sampler loop (§4.8 C9) and the step-by-step driver that plans a
//! whole-piece generation call and runs it (§4.7 dataflow: "validate ->
//! plan steps -> for each step: subset, generate, splice back").

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tok_codec::{decode, encode_piece, preprocess, resolve_bar_infill_tokens, resample_delta};
use tok_controls::compute_all_features;
use tok_grammar::ModelMode;
use tok_model::validate::{pad_piece_with_status, validate_piece, validate_status};
use tok_model::{HyperParam, Piece, Status};
use tok_plan::{plan, BoolMatrix, Step};
use tok_sample::SampleControl;
use tok_vocab::{Representation, TokenType};

use crate::callback::CallbackManager;
use crate::error::{GenerateError, ModelError};
use crate::model::Model;
use crate::window::{extract_window, splice_back};

/// Runs the full plan-then-generate pipeline over `piece` (§4.7 dataflow).
/// Validates, builds the selection/resample/ignore matrices `status`
/// implies, plans the step list, and drives [`generate_step`] over each one
/// in order, mutating `piece` in place.
///
/// # Errors
/// Propagates validation, planning, encoding, or sampling failures.
pub fn generate_piece<M: Model>(
    piece: &mut Piece,
    status: &Status,
    hyperparam: &HyperParam,
    rep: &Arc<Representation>,
    model: &M,
    callbacks: &mut CallbackManager,
) -> Result<(), GenerateError> {
    let span = tracing::debug_span!("generate_piece", tracks = piece.tracks.len(), bars = piece.bar_count());
    let _enter = span.enter();

    pad_piece_with_status(piece, status);
    validate_piece(piece)?;
    validate_status(piece, status, hyperparam)?;
    compute_all_features(piece);

    let nt = piece.tracks.len();
    let nb = piece.bar_count();
    let mut selection = BoolMatrix::new(nt, nb, false);
    let mut resample = vec![false; nt];
    let mut ignore = vec![false; nt];
    for (track_idx, status_track) in status.tracks.iter().enumerate() {
        resample[track_idx] = status_track.autoregressive;
        ignore[track_idx] = status_track.ignore;
        for (bar_idx, &selected) in status_track.selected_bars.iter().enumerate() {
            if selected {
                selection.set(track_idx, bar_idx, true);
            }
        }
    }

    let steps = plan(&selection, &resample, &ignore, hyperparam)?;
    if hyperparam.verbosity.logs_boundaries() {
        tracing::debug!(steps = steps.len(), "planned generation steps");
    }
    for (idx, step) in steps.iter().enumerate() {
        if hyperparam.verbosity.logs_boundaries() {
            tracing::debug!(step = idx, start = step.start, end = step.end, "driving step");
        }
        generate_step(piece, status, step, hyperparam, rep, model, callbacks)?;
    }

    if rep.has_token_type(TokenType::Delta) {
        resample_delta(piece, piece.resolution);
        compute_all_features(piece);
    }
    Ok(())
}

/// Runs one planner [`Step`]: subsets `piece`/`status` to the step's window,
/// builds a `batch_size`-row prompt, drives `model` one token at a time
/// under [`SampleControl`]'s constraints until every row finishes or
/// `max_steps` is hit, decodes row 0, and splices its generated bars back
/// into `piece`.
///
/// # Errors
/// Propagates encoding, sampling, or model failures.
pub fn generate_step<M: Model>(
    piece: &mut Piece,
    status: &Status,
    step: &Step,
    hyperparam: &HyperParam,
    rep: &Arc<Representation>,
    model: &M,
    callbacks: &mut CallbackManager,
) -> Result<(), GenerateError> {
    let span = tracing::debug_span!("generate_step", start = step.start, end = step.end);
    let _enter = span.enter();

    let window = extract_window(piece, status, step);
    let mut window_piece = window.piece;
    preprocess(&mut window_piece)?;
    let mut base_tokens = encode_piece(&window_piece, rep, &window.multi_fill)?;
    if window.mode == ModelMode::BarInfill {
        // The trailing FILL_IN_START..FILL_IN_END blocks encode the ground
        // truth for the bars being filled in; the prompt stops right before
        // the model is meant to start generating them (§4.6 responsibility 1).
        if let Some(cut) = base_tokens
            .iter()
            .position(|&id| rep.token_type_of(id) == Ok(TokenType::FillInStart))
        {
            base_tokens.truncate(cut);
        }
    }

    let batch_size = hyperparam.batch_size.max(1);
    let relevant_mask =
        rep.type_mask(&[TokenType::NoteOnset, TokenType::TimeAbsolutePos, TokenType::NoteDuration]);

    let mut controls: Vec<SampleControl> = (0..batch_size)
        .map(|_| SampleControl::new(rep.clone(), &window_piece, &window.status, hyperparam))
        .collect::<Result<_, _>>()?;
    let mut sequences: Vec<Vec<u32>> = vec![base_tokens; batch_size];

    callbacks.start();
    let mut cache = M::Cache::default();
    let mut temperature = hyperparam.effective_temperature();
    let mut rng = hyperparam.sampling_seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

    let mut cancelled = false;
    for _ in 0..hyperparam.max_steps {
        if controls[0].finished() {
            break;
        }
        if callbacks.cancelled() {
            if hyperparam.verbosity.logs_boundaries() {
                tracing::debug!("generation cancelled, discarding in-flight step");
            }
            cancelled = true;
            break;
        }
        let prompt: Vec<Vec<i32>> =
            sequences.iter().map(|seq| seq.iter().map(|&t| t as i32).collect()).collect();
        let logits_batch = model.forward(&prompt, &mut cache)?;
        if logits_batch.len() != batch_size {
            return Err(GenerateError::Model(ModelError(format!(
                "model returned {} rows, expected batch_size {batch_size}",
                logits_batch.len()
            ))));
        }

        for row in 0..batch_size {
            if controls[row].finished() {
                continue;
            }
            let mask = controls[row].get_mask(&sequences[row])?;
            let mut logits = logits_batch[row].clone();
            for (id, &allowed) in mask.iter().enumerate() {
                if allowed == 0 {
                    logits[id] = f32::NEG_INFINITY;
                }
            }
            maybe_suppress_top(&mut rng, &mask, &relevant_mask, hyperparam.mask_top_k, &mut logits);

            let token = sample_token(&mut rng, &logits, temperature)?;
            if hyperparam.verbosity.logs_tokens() {
                tracing::trace!(row, token, "sampled token");
            }
            callbacks.prediction(&logits, token);
            sequences[row].push(token);
            controls[row].update(token)?;
            if rep.token_type_of(token) == Ok(TokenType::BarEnd) {
                if hyperparam.verbosity.logs_boundaries() {
                    tracing::debug!(row, "bar end");
                }
                callbacks.bar_end();
            }
        }
        temperature = callbacks.temperature(temperature);
    }

    // No token is emitted once cancelled; the caller sees the piece exactly
    // as it was before this step started (§5 concurrency model).
    if cancelled {
        return Ok(());
    }

    let resolved = resolve_bar_infill_tokens(&sequences[0], rep)?;
    let decoded = decode(&resolved, rep, window_piece.resolution, window_piece.tempo)?;
    splice_back(piece, &decoded, step);
    compute_all_features(piece);
    Ok(())
}

/// Retries [`generate_step`] up to `max_attempts` times, raising temperature
/// via the callback manager between attempts, until at least one of the
/// step's generated bars differs from its pre-generation note content
/// (byte-identical meaning the same sorted onset/offset list).
///
/// # Errors
/// Returns [`GenerateError::ExhaustedAttempts`] if every attempt reproduces
/// the input unchanged; otherwise propagates the first hard failure.
pub fn sample_multi_attempts<M: Model>(
    piece: &mut Piece,
    status: &Status,
    step: &Step,
    hyperparam: &HyperParam,
    rep: &Arc<Representation>,
    model: &M,
    callbacks: &mut CallbackManager,
    max_attempts: usize,
) -> Result<(), GenerateError> {
    let before: Vec<Vec<(u32, u8, u8, i32)>> = step
        .bar_mapping
        .iter()
        .map(|m| sorted_bar_signature(piece, m.global_track, m.global_bar))
        .collect();

    let mut attempt_hyperparam = hyperparam.clone();
    for attempt in 0..max_attempts.max(1) {
        generate_step(piece, status, step, &attempt_hyperparam, rep, model, callbacks)?;
        let after: Vec<Vec<(u32, u8, u8, i32)>> = step
            .bar_mapping
            .iter()
            .map(|m| sorted_bar_signature(piece, m.global_track, m.global_bar))
            .collect();
        if before != after {
            return Ok(());
        }
        if attempt + 1 < max_attempts {
            attempt_hyperparam.temperature = callbacks.temperature(attempt_hyperparam.temperature);
        }
    }
    if hyperparam.verbosity.logs_boundaries() {
        tracing::warn!(attempts = max_attempts.max(1), "every attempt reproduced the input unchanged");
    }
    Err(GenerateError::ExhaustedAttempts { attempts: max_attempts.max(1) })
}

fn sorted_bar_signature(piece: &Piece, track: usize, bar: usize) -> Vec<(u32, u8, u8, i32)> {
    let bar = &piece.tracks[track].bars[bar];
    let mut signature: Vec<(u32, u8, u8, i32)> =
        bar.events.iter().map(|&idx| piece.events[idx]).map(|e| (e.time, e.pitch, e.velocity, e.delta)).collect();
    signature.sort_unstable();
    signature
}

/// With probability `probability`, and only when the allowed set includes a
/// note-onset/absolute-position/duration token, suppresses the single
/// highest-logit allowed id (a stochastic diversity knob, §4.8).
fn maybe_suppress_top(rng: &mut StdRng, mask: &[i32], relevant_mask: &[i32], probability: f32, logits: &mut [f32]) {
    if probability <= 0.0 {
        return;
    }
    let any_relevant_allowed =
        mask.iter().zip(relevant_mask).any(|(&allowed, &relevant)| allowed != 0 && relevant != 0);
    if !any_relevant_allowed || rng.gen::<f32>() >= probability {
        return;
    }
    if let Some((top, _)) = logits
        .iter()
        .enumerate()
        .filter(|&(id, _)| mask[id] != 0)
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
    {
        logits[top] = f32::NEG_INFINITY;
    }
}

/// Temperature-scaled softmax multinomial sample over `logits` (masked
/// entries already set to `-inf`).
fn sample_token(rng: &mut StdRng, logits: &[f32], temperature: f32) -> Result<u32, GenerateError> {
    let max_logit = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max_logit.is_finite() {
        return Err(GenerateError::Model(ModelError("no token has finite probability under the mask".into())));
    }
    let weights: Vec<f32> = logits.iter().map(|&l| ((l - max_logit) / temperature).exp()).collect();
    let total: f32 = weights.iter().sum();
    let threshold = rng.gen::<f32>() * total;
    let mut acc = 0.0f32;
    for (id, &w) in weights.iter().enumerate() {
        acc += w;
        if acc >= threshold {
            return Ok(id as u32);
        }
    }
    Ok((weights.len() - 1) as u32)
}

#[cfg(test)]
mod tests {
    use tok_model::{Bar, SelectionClass, StatusBar, StatusTrack, Track, TrackType};
    use tok_vocab::build_default_representation;

    use super::*;

    /// A model stub returning a uniform distribution over the vocabulary,
    /// exercising masking/sampling without a real network (§4.8).
    struct UniformModel {
        vocab_size: usize,
    }

    impl Model for UniformModel {
        type Cache = ();

        fn forward(&self, prompt: &[Vec<i32>], _cache: &mut Self::Cache) -> Result<Vec<Vec<f32>>, ModelError> {
            Ok(prompt.iter().map(|_| vec![0.0f32; self.vocab_size]).collect())
        }
    }

    fn empty_status_track(bars: usize, autoregressive: bool) -> StatusTrack {
        StatusTrack {
            selected_bars: vec![autoregressive; bars],
            autoregressive,
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
            bars: vec![StatusBar::default(); bars],
        }
    }

    fn one_bar_piece() -> Piece {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        track.bars.push(Bar::new(4, 4));
        piece.tracks.push(track);
        piece
    }

    fn two_bar_piece() -> Piece {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        track.bars.push(Bar::new(4, 4));
        track.bars.push(Bar::new(4, 4));
        piece.tracks.push(track);
        piece
    }

    #[test]
    fn generate_piece_runs_to_completion_with_uniform_model() {
        let rep = Arc::new(build_default_representation().unwrap());
        let mut piece = one_bar_piece();
        let mut status = Status::default();
        status.tracks.push(empty_status_track(1, true));
        let hyperparam = HyperParam { model_dim: 1, max_steps: 2000, ..HyperParam::default() };
        let model = UniformModel { vocab_size: rep.vocab_size() as usize };
        let mut callbacks = CallbackManager::new();

        let result = generate_piece(&mut piece, &status, &hyperparam, &rep, &model, &mut callbacks);
        assert!(result.is_ok());
        assert_eq!(status.tracks[0].classify(), SelectionClass::Resample);
    }

    #[test]
    fn generate_piece_runs_bar_infill_to_completion_with_uniform_model() {
        let rep = Arc::new(build_default_representation().unwrap());
        let mut piece = two_bar_piece();
        let mut status = Status::default();
        let mut status_track = empty_status_track(2, false);
        status_track.selected_bars = vec![false, true];
        status.tracks.push(status_track);
        let hyperparam =
            HyperParam { model_dim: 2, bars_per_step: 2, max_steps: 2000, ..HyperParam::default() };
        let model = UniformModel { vocab_size: rep.vocab_size() as usize };
        let mut callbacks = CallbackManager::new();

        assert_eq!(status.tracks[0].classify(), SelectionClass::Infill);
        let result = generate_piece(&mut piece, &status, &hyperparam, &rep, &model, &mut callbacks);
        assert!(result.is_ok());
    }

    #[test]
    fn cancellation_stops_before_any_bar_is_finished() {
        let rep = Arc::new(build_default_representation().unwrap());
        let mut piece = one_bar_piece();
        let status_track = empty_status_track(1, true);
        let mut status = Status::default();
        status.tracks.push(status_track);
        let hyperparam = HyperParam { model_dim: 1, max_steps: 2000, ..HyperParam::default() };
        let model = UniformModel { vocab_size: rep.vocab_size() as usize };
        let mut callbacks = CallbackManager::new().with_is_cancelled(|| true);

        let result = generate_piece(&mut piece, &status, &hyperparam, &rep, &model, &mut callbacks);
        assert!(result.is_ok());
    }
}
