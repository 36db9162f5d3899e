//! api/tok-api/src/error.rs
//! Unified error type over every `tok-*` crate, for callers that don't want
//! to match on each crate's error enum individually.

use thiserror::Error;
use tok_codec::CodecError;
use tok_generate::{GenerateError, ModelError};
use tok_grammar::GrammarError;
use tok_model::PieceError;
use tok_plan::PlanError;
use tok_sample::SampleError;
use tok_vocab::VocabError;

/// Top-level error covering piece validation, encoding, grammar traversal,
/// planning, sampling, and generation, plus the JSON/IO boundary described
/// in the external interface contract.
#[derive(Debug, Error)]
pub enum Error {
    /// A piece or status failed structural validation.
    #[error(transparent)]
    Piece(#[from] PieceError),
    /// A vocabulary operation failed (unregistered value, bad token id).
    #[error(transparent)]
    Vocab(#[from] VocabError),
    /// The grammar graph rejected a transition.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    /// Encoding or decoding between a piece and a token stream failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A planning step could not be built.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// The per-sequence constraint state machine rejected a token or ran dry.
    #[error(transparent)]
    Sample(#[from] SampleError),
    /// The generation loop failed to complete a planned window.
    #[error(transparent)]
    Generate(#[from] GenerateError),
    /// A caller-supplied [`tok_generate::Model`] failed to produce a forward pass.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Reading or writing a compressed dataset file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// A JSON payload could not be parsed, or failed to serialize.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
