//! core/tok-generate/src/error.rs

use thiserror::Error;
use tok_codec::CodecError;
use tok_model::PieceError;
use tok_plan::PlanError;
use tok_sample::SampleError;

/// Failures raised while running the generation loop over a planned window.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The piece or status failed structural validation.
    #[error(transparent)]
    Piece(#[from] PieceError),
    /// A planning step could not be built.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Encoding, decoding, or bar-infill splicing failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The per-sequence constraint state machine rejected a token or ran dry.
    #[error(transparent)]
    Sample(#[from] SampleError),
    /// The model failed to produce a forward pass.
    #[error(transparent)]
    Model(#[from] ModelError),
    /// `sample_multi_attempts` exhausted every attempt without producing a
    /// bar that differs from its input.
    #[error("no attempt out of {attempts} produced a changed bar")]
    ExhaustedAttempts {
        /// Number of attempts made.
        attempts: usize,
    },
}

/// A [`crate::Model`] forward pass failed.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("model forward pass failed: {0}")]
pub struct ModelError(pub String);
