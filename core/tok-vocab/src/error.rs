//! core/tok-vocab/src/error.rs
//! Errors raised while building or querying a token domain/representation.

use thiserror::Error;

use crate::token_type::TokenType;
use crate::token_value::TokenValue;

/// Failures from [`crate::TokenDomain`] and [`crate::Representation`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VocabError {
    /// `encode` was called with a value not registered in the domain.
    #[error("value {value} is not in the domain for token type {token_type:?}")]
    ValueNotInDomain {
        /// The token type whose domain was queried.
        token_type: TokenType,
        /// The rejected value, stringified.
        value: String,
    },
    /// A token id fell outside `[0, vocab_size)`.
    #[error("token id {id} is outside the vocabulary range [0,{vocab_size})")]
    InvalidToken {
        /// The offending id.
        id: u32,
        /// Total vocabulary size.
        vocab_size: u32,
    },
    /// `decode_int`/`decode_string`/`decode_timesig` was called against a
    /// token id whose backing value is a different kind.
    #[error("token id {id} cannot be decoded as the requested kind")]
    WrongDecodeKind {
        /// The offending id.
        id: u32,
    },
    /// A [`crate::TokenDomain`] constructor was asked to build more than
    /// 512 distinct values.
    #[error("token domain requested {requested} values, exceeding the 512 cap")]
    TokenDomainTooLarge {
        /// The requested size.
        requested: usize,
    },
}

impl VocabError {
    /// Builds a [`VocabError::ValueNotInDomain`] from a displayable value.
    #[must_use]
    pub fn value_not_in_domain(token_type: TokenType, value: &TokenValue) -> Self {
        Self::ValueNotInDomain { token_type, value: value.to_string() }
    }
}
