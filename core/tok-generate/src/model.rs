//! core/tok-generate/src/model.rs
//! The one opaque external collaborator the sampler loop depends on (§4.8
//! C9). No production implementation ships here; a model lives on the other
//! side of this trait (an ONNX session, a remote RPC call, whatever the
//! caller wires up) and only needs to satisfy `forward`.

use crate::error::ModelError;

/// A next-token distribution source. `Cache` carries whatever per-call state
/// the model needs to avoid recomputing attention over the whole prompt on
/// every step (a KV-cache, typically); `Self::Cache::default()` is its
/// empty-history value.
pub trait Model {
    /// Per-sequence incremental state threaded through successive `forward`
    /// calls within one generation loop.
    type Cache: Default;

    /// Runs one forward pass over `prompt` (one row per batch sequence,
    /// already-sampled token ids as `i32`) and returns one logit vector per
    /// row, sized to the active vocabulary.
    ///
    /// # Errors
    /// Returns [`ModelError`] if the underlying model fails to produce a
    /// prediction (an RPC failure, a shape mismatch, an out-of-memory error).
    fn forward(&self, prompt: &[Vec<i32>], cache: &mut Self::Cache) -> Result<Vec<Vec<f32>>, ModelError>;
}
