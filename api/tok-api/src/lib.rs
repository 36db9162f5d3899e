//! Public surface for higher-level callers (CLI, service, notebook glue):
//! the piece/status/hyperparameter data model, the token vocabulary and
//! grammar, the sampler loop, and a single [`Error`] unifying every
//! `tok-*` crate's own error enum.
//!
//! Nothing in this crate adds behavior; it only re-exports and wires error
//! conversions so a caller can depend on one crate instead of eight.

#![deny(missing_docs)]

/// Dataset-file header DTOs (§6); the writer/reader itself is external.
pub mod dataset;
/// Unified error type over every `tok-*` crate.
pub mod error;

pub use dataset::{DatasetHeader, DatasetRange};
pub use error::Error;

pub use tok_codec::{decode, encode_piece, preprocess, resample_delta, resolve_bar_infill_tokens};
pub use tok_generate::{
    generate_piece, generate_step, sample_multi_attempts, CallbackManager, Model, ModelError,
};
pub use tok_grammar::{Graph, ModelMode};
pub use tok_model::{
    validate::{pad_piece_with_status, validate_piece, validate_status},
    Bar, Event, HyperParam, Piece, SelectionClass, Status, StatusBar, StatusTrack, Track,
    TrackType, Verbosity,
};
pub use tok_plan::{plan, BarMapping, Step};
pub use tok_sample::SampleControl;
pub use tok_vocab::{Representation, TokenType, TokenValue};

/// A result type aliased to this crate's unified [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
