//! Sampler loop (C9): drives a [`Model`] one token at a time over a planned
//! bar window, composing the grammar/constraint mask from `tok-sample`,
//! sampling under temperature, and splicing the result back into the piece.
//!
//! [`generate_piece`] is the whole-piece entry point (validate -> plan ->
//! drive every step); [`generate_step`] runs a single [`tok_plan::Step`].
//! [`sample_multi_attempts`] wraps either with byte-identical-output retry.

pub mod callback;
pub mod error;
pub mod generate;
pub mod model;
pub mod window;

pub use callback::CallbackManager;
pub use error::{GenerateError, ModelError};
pub use generate::{generate_piece, generate_step, sample_multi_attempts};
pub use model::Model;
pub use window::{extract_window, splice_back, Window};
