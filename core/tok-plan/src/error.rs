//! core/tok-plan/src/error.rs

use thiserror::Error;

/// Failures raised while building a generation plan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// The autoregressive and infill passes together left selected cells
    /// uncovered.
    #[error("planner failed to cover {uncovered} selected bar(s)")]
    CoverageIncomplete {
        /// Number of selected cells left uncovered after both passes.
        uncovered: usize,
    },
    /// `model_dim` exceeds the piece's bar count, so no window fits.
    #[error("model_dim {model_dim} exceeds bar count {bar_count}")]
    WindowTooLarge {
        /// The requested window width.
        model_dim: usize,
        /// The piece's bar count.
        bar_count: usize,
    },
    /// `selection`'s row count does not match `resample`/`ignore`'s length.
    #[error("selection has {selection_rows} row(s), but resample/ignore have {vector_len}")]
    ShapeMismatch {
        /// Row count of the selection matrix.
        selection_rows: usize,
        /// Length of the resample/ignore vectors.
        vector_len: usize,
    },
}
