//! core/tok-sample/src/error.rs

use thiserror::Error;
use tok_grammar::GrammarError;
use tok_vocab::VocabError;

/// Failures raised while driving a [`crate::SampleControl`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SampleError {
    /// A vocabulary operation failed while decoding or encoding a token.
    #[error(transparent)]
    Vocab(#[from] VocabError),
    /// The grammar graph rejected a transition.
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    /// `build_mask` collapsed to all-zero before the sequence finished.
    #[error("no legal next token at history length {history_len}")]
    NoLegalToken {
        /// Number of tokens already processed when the mask collapsed.
        history_len: usize,
    },
}
