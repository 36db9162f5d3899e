//! core/tok-vocab/src/token_type.rs
//! The closed set of token categories. Each has its own [`crate::TokenDomain`]
//! and, once composed into a [`crate::Representation`], its own contiguous id
//! slice.

use serde::{Deserialize, Serialize};

/// One category of token. Structural types drive the grammar (`tok-grammar`);
/// attribute types are emitted by `tok-controls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    // --- structural ---
    /// Start-of-piece marker; the grammar's entry node.
    PieceStart,
    /// Optional declared bar count for the piece.
    NumBars,
    /// Start-of-bar marker.
    Bar,
    /// End-of-bar marker.
    BarEnd,
    /// Time signature declaration for the current bar.
    TimeSignature,
    /// Start-of-track marker, carrying the track's kind.
    Track,
    /// End-of-track marker.
    TrackEnd,
    /// Instrument program, subject to pretrain-group remapping.
    Instrument,
    /// Note onset at a pitch.
    NoteOnset,
    /// Note duration class following an onset.
    NoteDuration,
    /// Absolute bar-relative time position.
    TimeAbsolutePos,
    /// Marks a bar whose notes are deferred to a trailing fill block.
    FillInPlaceholder,
    /// Opens a trailing fill block.
    FillInStart,
    /// Closes a trailing fill block.
    FillInEnd,
    /// Microtiming magnitude.
    Delta,
    /// Microtiming sign (present only for negative deltas).
    DeltaDirection,
    /// Velocity class, emitted on change.
    VelocityLevel,

    // --- attribute control tokens (C4) ---
    /// `PolyphonyQuantile` 15th-percentile class (10 classes).
    MinPolyphony,
    /// `PolyphonyQuantile` 85th-percentile class (10 classes).
    MaxPolyphony,
    /// `NoteDurationQuantile` 15th-percentile class (6 classes).
    MinNoteDuration,
    /// `NoteDurationQuantile` 85th-percentile class (6 classes).
    MaxNoteDuration,
    /// `NoteDensity` binned average notes/bar (10 classes).
    DensityLevel,
    /// `TrackLevelOnsetPolyphony` minimum concurrent onsets (6 classes).
    TrackMinOnsetPolyphony,
    /// `TrackLevelOnsetPolyphony` maximum concurrent onsets (6 classes).
    TrackMaxOnsetPolyphony,
    /// `TrackLevelOnsetDensity` minimum unique onsets per bar (18 classes).
    TrackMinOnsetDensity,
    /// `TrackLevelOnsetDensity` maximum unique onsets per bar (18 classes).
    TrackMaxOnsetDensity,
    /// `TrackLevelNoteDuration` "contains duration class 0" boolean.
    NoteDurationClass0,
    /// `TrackLevelNoteDuration` "contains duration class 1" boolean.
    NoteDurationClass1,
    /// `TrackLevelNoteDuration` "contains duration class 2" boolean.
    NoteDurationClass2,
    /// `TrackLevelNoteDuration` "contains duration class 3" boolean.
    NoteDurationClass3,
    /// `TrackLevelNoteDuration` "contains duration class 4" boolean.
    NoteDurationClass4,
    /// `TrackLevelNoteDuration` "contains duration class 5" boolean.
    NoteDurationClass5,
    /// `PitchRange` observed minimum pitch (128 classes).
    TrackMinPitch,
    /// `PitchRange` observed maximum pitch (128 classes).
    TrackMaxPitch,
    /// `Genre` label.
    Genre,
    /// `BarLevelOnsetPolyphony` minimum concurrent onsets (6 classes).
    BarMinOnsetPolyphony,
    /// `BarLevelOnsetPolyphony` maximum concurrent onsets (6 classes).
    BarMaxOnsetPolyphony,
    /// `BarLevelOnsetDensity` unique onsets in the bar (18 classes).
    BarOnsetDensity,
}

impl TokenType {
    /// All variants, in their vocabulary declaration order (see
    /// `tok_vocab::representation::default_spec`). Exposed so other crates
    /// can iterate the full set without depending on enum internals.
    #[must_use]
    pub const fn note_duration_classes() -> [TokenType; 6] {
        [
            TokenType::NoteDurationClass0,
            TokenType::NoteDurationClass1,
            TokenType::NoteDurationClass2,
            TokenType::NoteDurationClass3,
            TokenType::NoteDurationClass4,
            TokenType::NoteDurationClass5,
        ]
    }
}
