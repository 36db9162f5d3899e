//! core/tok-model/src/error.rs
//! Error type for the piece data model and its validation pass.

use thiserror::Error;

/// Failures raised while constructing, validating, or padding a [`crate::Piece`]
/// or a [`crate::Status`] against it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PieceError {
    /// A numeric field fell outside its declared range, or a JSON field was
    /// malformed/unknown. Names the offending field.
    #[error("invalid field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: String,
        /// Human-readable reason.
        reason: String,
    },
    /// Tracks in the piece do not all have the same number of bars.
    #[error("track {track} has {actual} bars, expected {expected}")]
    UnequalTrackLength {
        /// Index of the offending track.
        track: usize,
        /// Bar count found.
        actual: usize,
        /// Bar count expected (from track 0).
        expected: usize,
    },
    /// Time signatures disagree across tracks for the same bar index.
    #[error("bar {bar} has inconsistent time signatures across tracks")]
    InconsistentTimeSignature {
        /// Bar index where the mismatch was found.
        bar: usize,
    },
    /// An event referenced by a bar has a time outside `[0, beat_length*resolution]`.
    #[error("event {event} in track {track} bar {bar} has time {time} outside [0,{limit}]")]
    EventOutsideBar {
        /// Track index.
        track: usize,
        /// Bar index.
        bar: usize,
        /// Offending event index into the flat event pool.
        event: usize,
        /// The event's time.
        time: u32,
        /// The bar's upper time bound.
        limit: u32,
    },
    /// The piece declared a resolution of zero.
    #[error("piece resolution must be nonzero")]
    ZeroResolution,
    /// A status track references a track index outside the piece.
    #[error("status track index {index} out of range (piece has {len} tracks)")]
    TrackIndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of tracks in the piece.
        len: usize,
    },
    /// The status requested fewer selected bars than the hyperparameter `model_dim`.
    #[error("status selects {selected} bars, fewer than model_dim {model_dim}")]
    TooFewSelectedBars {
        /// Bars actually selected.
        selected: usize,
        /// Required minimum.
        model_dim: usize,
    },
    /// A track marked `autoregressive` (resample) did not select all of its bars.
    #[error("resample track {track} must select all bars")]
    ResampleTrackPartiallySelected {
        /// Offending track index.
        track: usize,
    },
    /// A track marked `ignore` selected one or more bars.
    #[error("ignored track {track} must not select any bars")]
    IgnoredTrackHasSelection {
        /// Offending track index.
        track: usize,
    },
    /// MIDI parsing (external) produced a piece with zero events.
    #[error("parsed piece contains no events")]
    MissingNotes,
}
