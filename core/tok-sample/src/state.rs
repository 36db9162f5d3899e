//! core/tok-sample/src/state.rs
//! One generation sequence's state machine (§4.6 C7): plan, per-track
//! attribute masks, running counters, and the `update`/`get_mask` pair that
//! drives constrained sampling one token at a time.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use smallvec::SmallVec;
use tok_controls::{set_bar_masks, set_track_masks};
use tok_grammar::{Grammar, ModelMode};
use tok_model::{HyperParam, Piece, SelectionClass, Status, StatusTrack, TrackType};
use tok_vocab::{Representation, TokenType, TokenValue};

use crate::error::SampleError;

/// How a [`StatusTrack`] was classified at plan time, plus its track index
/// in the piece, in the order tokens for it will appear in the stream
/// (condition tracks first, then resample tracks; identity order for
/// infill — §4.6 responsibility 1).
#[derive(Debug, Clone, Copy)]
struct PlannedTrack {
    piece_track: usize,
    class: SelectionClass,
}

/// Per-track-kind note-expiry entry: which pitches stop sounding at a
/// given absolute tick.
type ExpiryMap = BTreeMap<u32, SmallVec<[u8; 4]>>;

/// Drives one generation sequence: tracks musical running state, replays
/// `FILL_IN_START` backfill, and composes the next-token mask from the
/// grammar graph plus every additional constraint in §4.6.
#[derive(Debug, Clone)]
pub struct SampleControl {
    rep: Arc<Representation>,
    grammar: Grammar,
    mode: ModelMode,
    hyperparam: HyperParam,
    resolution: u32,

    planned_tracks: Vec<PlannedTrack>,
    track_attr_masks: Vec<Vec<i32>>,
    bar_time_signature: BTreeMap<(usize, usize), (u8, u8)>,
    bar_attr_masks: BTreeMap<(usize, usize), Vec<i32>>,
    attribute_position_mask: Vec<i32>,
    default_polyphony_limit: u32,
    per_track_polyphony_limit: Vec<Option<u32>>,

    barlength: u32,
    timestep: u32,
    absolute_timestep: u32,
    bar_start_timestep: u32,
    bar_count: usize,
    local_bar_index: usize,
    track_count: usize,
    infill_bar_count: usize,
    onsets: HashSet<u8>,
    note_expiry: ExpiryMap,
    last_token: Option<u32>,
    current_track_type: Option<TrackType>,
    current_track_index: Option<usize>,
    pending_delta_sign: i32,
    last_onset_pitch: Option<u8>,

    finished: bool,
    history: Vec<u32>,
    placeholder_positions: Vec<usize>,

    num_bars_target: usize,
    num_tracks_target: usize,
    num_infill_bars_target: usize,
}

impl SampleControl {
    /// Plans the generation sequence from `piece`/`status`/`hyperparam`:
    /// classifies every track, picks [`ModelMode`], builds the grammar, and
    /// precomputes per-track attribute masks (§4.6 responsibilities 1-2).
    pub fn new(
        rep: Arc<Representation>,
        piece: &Piece,
        status: &Status,
        hyperparam: &HyperParam,
    ) -> Result<Self, SampleError> {
        let mut planned_tracks = Vec::new();
        let mut condition = Vec::new();
        let mut resample = Vec::new();
        let mut any_infill = false;

        for (idx, track) in piece.tracks.iter().enumerate() {
            let default_status = StatusTrack {
                selected_bars: vec![false; track.bars.len()],
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
                bars: Vec::new(),
            };
            let status_track = status.tracks.get(idx).unwrap_or(&default_status);
            if status_track.ignore {
                continue;
            }
            match status_track.classify() {
                SelectionClass::Condition => condition.push(PlannedTrack { piece_track: idx, class: SelectionClass::Condition }),
                SelectionClass::Resample => resample.push(PlannedTrack { piece_track: idx, class: SelectionClass::Resample }),
                SelectionClass::Infill => {
                    any_infill = true;
                    resample.push(PlannedTrack { piece_track: idx, class: SelectionClass::Infill });
                }
            }
        }

        let mode = if any_infill { ModelMode::BarInfill } else { ModelMode::Track };
        if mode == ModelMode::Track {
            planned_tracks.extend(condition);
            planned_tracks.extend(resample);
        } else {
            planned_tracks = (0..piece.tracks.len())
                .filter(|idx| status.tracks.get(*idx).is_none_or(|t| !t.ignore))
                .map(|idx| {
                    let class = status.tracks.get(idx).map_or(SelectionClass::Condition, StatusTrack::classify);
                    PlannedTrack { piece_track: idx, class }
                })
                .collect();
        }

        let grammar = Grammar::initialize(&rep, mode);

        let mut track_attr_masks = vec![Vec::new(); piece.tracks.len()];
        let mut per_track_polyphony_limit = vec![None; piece.tracks.len()];
        let mut bar_time_signature = BTreeMap::new();
        let mut bar_attr_masks = BTreeMap::new();

        for planned in &planned_tracks {
            if !matches!(planned.class, SelectionClass::Resample | SelectionClass::Infill) {
                continue;
            }
            let Some(status_track) = status.tracks.get(planned.piece_track) else { continue };
            let mut mask = rep.mask_of(0i32);
            set_track_masks(&rep, &mut mask, status_track);
            track_attr_masks[planned.piece_track] = mask;
            per_track_polyphony_limit[planned.piece_track] = status_track.polyphony_hard_limit;

            for (bar_idx, status_bar) in status_track.bars.iter().enumerate() {
                if let Some(ts) = status_bar.time_signature {
                    bar_time_signature.insert((planned.piece_track, bar_idx), ts);
                }
                let mut bar_mask = rep.mask_of(0i32);
                set_bar_masks(&rep, &mut bar_mask, status_bar);
                bar_attr_masks.insert((planned.piece_track, bar_idx), bar_mask);
            }
        }

        let attribute_token_types: Vec<TokenType> =
            tok_controls::REGISTRY.into_iter().flat_map(|c| c.tokens().iter().map(|(tt, _)| *tt).collect::<Vec<_>>()).collect();
        let attribute_position_mask = rep.type_mask(&attribute_token_types);

        let num_bars_target = piece.bar_count();
        let num_tracks_target = planned_tracks.len();
        let num_infill_bars_target = planned_tracks
            .iter()
            .filter(|p| p.class == SelectionClass::Infill)
            .filter_map(|p| status.tracks.get(p.piece_track))
            .map(StatusTrack::selected_count)
            .sum();

        Ok(Self {
            rep,
            grammar,
            mode,
            hyperparam: hyperparam.clone(),
            resolution: piece.resolution,
            planned_tracks,
            track_attr_masks,
            bar_time_signature,
            bar_attr_masks,
            attribute_position_mask,
            default_polyphony_limit: hyperparam.polyphony_hard_limit,
            per_track_polyphony_limit,
            barlength: 4 * piece.resolution,
            timestep: 0,
            absolute_timestep: 0,
            bar_start_timestep: 0,
            bar_count: 0,
            local_bar_index: 0,
            track_count: 0,
            infill_bar_count: 0,
            onsets: HashSet::new(),
            note_expiry: BTreeMap::new(),
            last_token: None,
            current_track_type: None,
            current_track_index: None,
            pending_delta_sign: 1,
            last_onset_pitch: None,
            finished: false,
            history: Vec::new(),
            placeholder_positions: Vec::new(),
            num_bars_target,
            num_tracks_target,
            num_infill_bars_target,
        })
    }

    /// `true` once the planned sequence has emitted everything it needs.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// The pitches currently sounding.
    #[must_use]
    pub fn onsets(&self) -> &HashSet<u8> {
        &self.onsets
    }

    /// Processes any tokens in `tokens` not yet seen, then composes the
    /// next-token mask (§4.6 responsibility 5).
    pub fn get_mask(&mut self, tokens: &[u32]) -> Result<Vec<i32>, SampleError> {
        for &token in &tokens[self.history.len().min(tokens.len())..] {
            self.update(token)?;
        }
        self.build_mask()
    }

    /// Processes one emitted or prompt token, updating all running state
    /// (§4.6 responsibility 4).
    pub fn update(&mut self, token: u32) -> Result<(), SampleError> {
        self.history.push(token);
        self.apply(token)?;
        self.last_token = Some(token);
        self.evict_expired();
        Ok(())
    }

    /// The transition logic shared by live updates and `FILL_IN_START`
    /// backfill replay (§9 design note: single-sourced state machine).
    /// Does not itself touch `history`.
    fn apply(&mut self, token: u32) -> Result<(), SampleError> {
        let (tt, value) = self.rep.decode(token)?;
        // A BarInfill grammar is trimmed to the note-level token subset and
        // positioned at FILL_IN_END; the structural prefix of an infill
        // prompt (PIECE_START, NUM_BARS, TRACK, BAR, ...) replays through
        // here too but is not a node in that grammar, so it only updates
        // musical state below, without a graph traversal.
        if self.grammar.contains_token_type(tt) {
            let node = self.grammar.infer_node(tt)?;
            self.grammar.traverse(node)?;
        }
        match tt {
            TokenType::Track => {
                let TokenValue::Int(v) = value else { return Ok(()) };
                self.current_track_type = Some(if v == 0 { TrackType::Standard } else { TrackType::StandardDrum });
                self.current_track_index = self.planned_tracks.get(self.track_count).map(|p| p.piece_track);
                self.local_bar_index = 0;
                self.timestep = 0;
                self.bar_start_timestep = 0;
                self.absolute_timestep = 0;
                self.onsets.clear();
                self.note_expiry.clear();
                self.last_onset_pitch = None;
            }
            TokenType::TrackEnd => {
                self.track_count += 1;
                if self.mode == ModelMode::Track && self.track_count >= self.num_tracks_target {
                    self.finished = true;
                }
            }
            TokenType::Bar => {
                self.timestep = 0;
                self.barlength = 4 * self.resolution;
                self.absolute_timestep = self.bar_start_timestep;
            }
            TokenType::BarEnd => {
                self.bar_count += 1;
                self.local_bar_index += 1;
                self.bar_start_timestep += self.barlength;
            }
            TokenType::TimeSignature => {
                let TokenValue::TimeSig(n, d) = value else { return Ok(()) };
                self.barlength = u32::from(n) * 4 * self.resolution / u32::from(d.max(1));
            }
            TokenType::TimeAbsolutePos => {
                let TokenValue::Int(v) = value else { return Ok(()) };
                self.timestep = v as u32;
                self.absolute_timestep = self.bar_start_timestep + self.timestep;
            }
            TokenType::NoteOnset => {
                let TokenValue::Int(pitch) = value else { return Ok(()) };
                let pitch = pitch as u8;
                self.onsets.insert(pitch);
                self.last_onset_pitch = Some(pitch);
                if self.current_track_type.is_some_and(TrackType::is_drum) {
                    self.schedule_removal(pitch, 0);
                }
            }
            TokenType::NoteDuration => {
                let TokenValue::Int(v) = value else { return Ok(()) };
                if let Some(pitch) = self.last_onset_pitch {
                    self.schedule_removal(pitch, v as u32);
                }
            }
            TokenType::DeltaDirection => {
                self.pending_delta_sign = -1;
            }
            TokenType::Delta => {
                self.pending_delta_sign = 1;
            }
            TokenType::FillInPlaceholder => {
                self.placeholder_positions.push(self.history.len() - 1);
            }
            TokenType::FillInStart => {
                self.backfill()?;
            }
            TokenType::FillInEnd => {
                self.infill_bar_count += 1;
                if self.mode == ModelMode::BarInfill && self.infill_bar_count >= self.num_infill_bars_target {
                    self.finished = true;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn schedule_removal(&mut self, pitch: u8, duration: u32) {
        let at = self.absolute_timestep + duration + 1;
        self.note_expiry.entry(at).or_default().push(pitch);
    }

    fn evict_expired(&mut self) {
        let expired: Vec<u32> = self.note_expiry.range(..=self.absolute_timestep).map(|(&t, _)| t).collect();
        for t in expired {
            if let Some(pitches) = self.note_expiry.remove(&t) {
                for pitch in pitches {
                    self.onsets.remove(&pitch);
                }
            }
        }
    }

    /// Replays, through [`Self::apply`], every token between the
    /// `infill_bar_count`-th and `(infill_bar_count+1)`-th
    /// `FILL_IN_PLACEHOLDER` in `history` so state reflects the context
    /// surrounding this fill-in bar (§4.6 responsibility 4, `FILL_IN_START`).
    fn backfill(&mut self) -> Result<(), SampleError> {
        let (Some(&start), Some(&end)) =
            (self.placeholder_positions.get(self.infill_bar_count), self.placeholder_positions.get(self.infill_bar_count + 1))
        else {
            return Ok(());
        };
        let replay: Vec<u32> = self.history[start + 1..end].to_vec();
        for token in replay {
            self.apply(token)?;
        }
        Ok(())
    }

    fn polyphony_limit(&self) -> u32 {
        self.current_track_index
            .and_then(|idx| self.per_track_polyphony_limit.get(idx).copied().flatten())
            .unwrap_or(self.default_polyphony_limit)
    }

    fn microtiming_enabled(&self) -> bool {
        self.rep.has_token_type(TokenType::Delta)
    }

    /// Composes the allowed next-token set (§4.6 responsibility 6).
    fn build_mask(&mut self) -> Result<Vec<i32>, SampleError> {
        let mut mask = self.rep.mask_of(0i32);

        if let Some(current) = self.grammar.current() {
            for (tt, _) in self.grammar.next_nodes(current) {
                self.rep.set_mask(tt, &[-1], &mut mask, 1);
            }
        } else {
            self.rep.set_mask(TokenType::PieceStart, &[-1], &mut mask, 1);
        }

        let is_drum = self.current_track_type.is_some_and(TrackType::is_drum);
        let last_was_onset =
            self.last_token.map(|id| self.rep.token_type_of(id)) == Some(Ok(TokenType::NoteOnset));
        if is_drum && last_was_onset && self.rep.has_token_type(TokenType::NoteDuration) {
            self.rep.set_mask(TokenType::NoteDuration, &[-1], &mut mask, 0);
            self.rep.set_mask(TokenType::NoteDuration, &[0], &mut mask, 1);
        }

        for &pitch in &self.onsets {
            self.rep.set_mask(TokenType::NoteOnset, &[i32::from(pitch)], &mut mask, 0);
        }

        if self.timestep >= self.barlength {
            self.rep.set_mask(TokenType::NoteOnset, &[-1], &mut mask, 0);
            self.rep.set_mask(TokenType::VelocityLevel, &[-1], &mut mask, 0);
        }

        if self.onsets.len() as u32 >= self.polyphony_limit() {
            self.rep.set_mask(TokenType::NoteOnset, &[-1], &mut mask, 0);
            self.rep.set_mask(TokenType::VelocityLevel, &[-1], &mut mask, 0);
        }

        if !self.microtiming_enabled() {
            self.rep.set_mask(TokenType::Delta, &[-1], &mut mask, 0);
        } else {
            let last_was_delta = self.last_token.map(|id| self.rep.token_type_of(id)) == Some(Ok(TokenType::Delta));
            if last_was_delta {
                self.rep.set_mask(TokenType::Delta, &[-1], &mut mask, 0);
            }
            let domain = self.rep.domain_size(TokenType::Delta);
            for magnitude in 0..domain {
                let legal = if self.pending_delta_sign < 0 {
                    magnitude <= self.timestep
                } else {
                    self.timestep + magnitude <= self.barlength
                };
                if !legal {
                    self.rep.set_mask(TokenType::Delta, &[magnitude as i32], &mut mask, 0);
                }
            }
            if self.rep.has_token_type(TokenType::DeltaDirection) {
                if self.timestep == self.barlength {
                    self.rep.set_mask(TokenType::DeltaDirection, &[-1], &mut mask, 1);
                } else {
                    self.rep.set_mask(TokenType::DeltaDirection, &[-1], &mut mask, 0);
                }
            }
        }

        if self.rep.has_token_type(TokenType::TimeAbsolutePos) {
            let domain = self.rep.domain_size(TokenType::TimeAbsolutePos);
            for t in 0..domain {
                if t <= self.timestep || t > self.barlength {
                    self.rep.set_mask(TokenType::TimeAbsolutePos, &[t as i32], &mut mask, 0);
                }
            }
        }

        if self.rep.has_token_type(TokenType::TimeSignature) {
            self.apply_time_signature_mask(&mut mask);
        }

        match self.mode {
            ModelMode::Track => {
                if self.bar_count < self.num_bars_target {
                    self.rep.set_mask(TokenType::TrackEnd, &[-1], &mut mask, 0);
                } else {
                    self.rep.set_mask(TokenType::Bar, &[-1], &mut mask, 0);
                }
                self.apply_track_attribute_mask(&mut mask);
                self.apply_bar_attribute_mask(&mut mask);
            }
            ModelMode::BarInfill => {}
        }

        if mask.iter().all(|&v| v == 0) && !self.finished {
            return Err(SampleError::NoLegalToken { history_len: self.history.len() });
        }

        Ok(mask)
    }

    fn apply_time_signature_mask(&self, mask: &mut [i32]) {
        let Some(track_idx) = self.current_track_index else {
            self.rep.set_mask(TokenType::TimeSignature, &[-1], mask, 1);
            return;
        };
        let domain = self.rep.time_signature_domain();
        match self.bar_time_signature.get(&(track_idx, self.local_bar_index)) {
            Some(&ts) if domain.len() == 1 && domain[0] == ts => {
                self.rep.set_mask(TokenType::TimeSignature, &[-1], mask, 1);
            }
            Some(&ts) => {
                if let Ok(id) = self.rep.encode(TokenType::TimeSignature, ts) {
                    mask[id as usize] = 1;
                }
            }
            None => self.rep.set_mask(TokenType::TimeSignature, &[-1], mask, 1),
        }
    }

    fn apply_track_attribute_mask(&self, mask: &mut [i32]) {
        let Some(track_idx) = self.current_track_index else { return };
        let Some(attr_mask) = self.track_attr_masks.get(track_idx) else { return };
        if attr_mask.is_empty() {
            return;
        }
        for (i, position) in self.attribute_position_mask.iter().enumerate() {
            if *position == 1 {
                mask[i] *= attr_mask[i];
            }
        }
    }

    fn apply_bar_attribute_mask(&self, mask: &mut [i32]) {
        let Some(track_idx) = self.current_track_index else { return };
        let Some(bar_mask) = self.bar_attr_masks.get(&(track_idx, self.local_bar_index)) else { return };
        for (i, position) in self.attribute_position_mask.iter().enumerate() {
            if *position == 1 {
                mask[i] *= bar_mask[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tok_model::{Bar, Piece, Status, StatusTrack, Track};
    use tok_vocab::build_default_representation;

    use super::*;

    fn empty_status_track(bars: usize) -> StatusTrack {
        StatusTrack {
            selected_bars: vec![true; bars],
            autoregressive: true,
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
            bars: vec![Default::default(); bars],
        }
    }

    fn one_track_piece(bars: usize) -> Piece {
        let mut piece = Piece::new(12, 120.0);
        let mut track = Track::new(TrackType::Standard, 0);
        for _ in 0..bars {
            track.bars.push(Bar::new(4, 4));
        }
        piece.tracks.push(track);
        piece
    }

    #[test]
    fn starts_with_only_piece_start_legal() {
        let rep = Arc::new(build_default_representation().unwrap());
        let piece = one_track_piece(1);
        let mut status = Status::default();
        status.tracks.push(empty_status_track(1));
        let control = SampleControl::new(rep.clone(), &piece, &status, &HyperParam::default()).unwrap();
        assert!(!control.finished());
    }

    #[test]
    fn polyphony_hard_limit_zeros_onset_and_velocity() {
        let rep = Arc::new(build_default_representation().unwrap());
        let piece = one_track_piece(1);
        let mut status = Status::default();
        let mut st = empty_status_track(1);
        st.polyphony_hard_limit = Some(2);
        status.tracks.push(st);
        let mut control = SampleControl::new(rep.clone(), &piece, &status, &HyperParam::default()).unwrap();

        control.update(rep.encode(TokenType::PieceStart, 0i64).unwrap()).unwrap();
        control.update(rep.encode(TokenType::NumBars, 4i64).unwrap()).unwrap();
        control.update(rep.encode(TokenType::Track, 0i64).unwrap()).unwrap();
        control.onsets.insert(60);
        control.onsets.insert(64);

        let mask = control.build_mask().unwrap();
        let onset_start = rep.encode(TokenType::NoteOnset, 0i64).unwrap() as usize;
        let onset_domain = rep.domain_size(TokenType::NoteOnset) as usize;
        assert!(mask[onset_start..onset_start + onset_domain].iter().all(|&v| v == 0));
    }

    #[test]
    fn microtiming_disabled_zeros_delta_when_absent_from_representation() {
        let rep = Arc::new(build_default_representation().unwrap());
        let piece = one_track_piece(1);
        let mut status = Status::default();
        status.tracks.push(empty_status_track(1));
        let control = SampleControl::new(rep, &piece, &status, &HyperParam::default()).unwrap();
        assert!(control.microtiming_enabled());
    }
}
