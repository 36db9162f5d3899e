//! core/tok-model/src/hyperparam.rs
//! Generation-wide knobs. Doubles as this system's configuration surface
//! (§2.1 of the expanded design): no separate config-file format is invented,
//! callers load this from JSON/TOML themselves.

use serde::{Deserialize, Serialize};

/// How much the sampler loop logs via `tracing`. Replaces the original's
/// global mutable verbosity flag with a per-call value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No `tracing` events beyond `error!`.
    Silent,
    /// Bar/track boundaries logged at `debug!`.
    #[default]
    Normal,
    /// Every sampled token logged at `trace!`.
    Verbose,
}

impl Verbosity {
    /// Whether bar/track boundary events should be emitted at `debug!`.
    #[must_use]
    pub fn logs_boundaries(self) -> bool {
        !matches!(self, Self::Silent)
    }

    /// Whether individual sampled tokens should be emitted at `trace!`.
    #[must_use]
    pub fn logs_tokens(self) -> bool {
        matches!(self, Self::Verbose)
    }
}

/// Generation-wide hyperparameters shared by the planner and sampler loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HyperParam {
    /// Bars the model attends to at once.
    pub model_dim: usize,
    /// Tracks advanced per planner block.
    pub tracks_per_step: usize,
    /// Bars advanced per planner block.
    pub bars_per_step: usize,
    /// Softmax temperature; clamped to `>= 1e-6` before use.
    pub temperature: f32,
    /// Rows per model forward call.
    pub batch_size: usize,
    /// Hard cap on sampler steps, regardless of `finished`.
    pub max_steps: usize,
    /// Default hard polyphony cap when a track's status does not override it.
    pub polyphony_hard_limit: u32,
    /// Probability of applying the stochastic top-1 suppression diversity knob.
    pub mask_top_k: f32,
    /// Fixed RNG seed for reproducible sampling; `None` seeds from entropy.
    pub sampling_seed: Option<u64>,
    /// Logging verbosity for this generation call.
    pub verbosity: Verbosity,
    /// Shuffle newly appended infill steps before truncation.
    pub shuffle: bool,
    /// Percentage (0-100) of infill steps to keep after shuffling.
    pub percentage: u8,
}

impl Default for HyperParam {
    fn default() -> Self {
        Self {
            model_dim: 4,
            tracks_per_step: 1,
            bars_per_step: 4,
            temperature: 1.0,
            batch_size: 1,
            max_steps: 10_000,
            polyphony_hard_limit: 8,
            mask_top_k: 0.0,
            sampling_seed: None,
            verbosity: Verbosity::default(),
            shuffle: false,
            percentage: 100,
        }
    }
}

impl HyperParam {
    /// Temperature clamped to the sampler's floor, never zero.
    #[must_use]
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.max(1e-6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_planner_reference() {
        let hp = HyperParam::default();
        assert_eq!(hp.model_dim, 4);
        assert_eq!(hp.tracks_per_step, 1);
        assert_eq!(hp.bars_per_step, 4);
        assert!(!hp.shuffle);
        assert_eq!(hp.percentage, 100);
    }

    #[test]
    fn temperature_floors_at_epsilon() {
        let mut hp = HyperParam::default();
        hp.temperature = 0.0;
        assert!(hp.effective_temperature() >= 1e-6);
    }
}
