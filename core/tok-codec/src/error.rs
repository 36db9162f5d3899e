//! core/tok-codec/src/error.rs

use thiserror::Error;
use tok_model::PieceError;
use tok_vocab::VocabError;

/// Failures raised while encoding a [`tok_model::Piece`] to tokens or
/// decoding a token stream back into one.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The piece failed structural validation before encoding.
    #[error(transparent)]
    InvalidPiece(#[from] PieceError),
    /// A vocabulary operation failed (unregistered value, bad token id).
    #[error(transparent)]
    Vocab(#[from] VocabError),
    /// A decoded token id fell outside `[0, vocab_size)`.
    #[error("token id {id} is outside the representation's vocabulary size {vocab_size}")]
    InvalidToken { id: u32, vocab_size: u32 },
}
