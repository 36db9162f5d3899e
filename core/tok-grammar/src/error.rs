//! core/tok-grammar/src/error.rs

use thiserror::Error;
use tok_vocab::TokenType;

/// Failures raised while traversing or building a [`crate::graph::Graph`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// `traverse`/`skip` found no path of the allowed depth from the
    /// current node to the requested one.
    #[error("no path of depth <= {max_depth} from {from:?} to {to:?}")]
    NoPath { from: (TokenType, u32), to: (TokenType, u32), max_depth: u32 },
    /// `skip`/`traverse` called before a traversal has started.
    #[error("traversal has not started")]
    NotStarted,
    /// `infer_node` could not find a node matching the last emitted token.
    #[error("cannot infer node for token type {token_type:?}")]
    CannotInferNode { token_type: TokenType },
    /// `possibly_skip` exceeded its iteration cap without reaching a stable
    /// node; the graph likely contains a cycle reachable entirely through
    /// skipped (disabled) nodes.
    #[error("infinite loop while skipping disabled nodes")]
    InfiniteLoop,
}
