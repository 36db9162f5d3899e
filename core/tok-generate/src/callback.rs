//! core/tok-generate/src/callback.rs
//! Suspension points the sampler loop invokes between model forwards (§5).
//! Every slot defaults to a no-op so a caller only wires up the ones it needs.

/// Bundles the sampler loop's five suspension-point hooks. Constructed with
/// [`CallbackManager::default`] and customized with the builder setters.
pub struct CallbackManager {
    on_start: Box<dyn FnMut() + Send>,
    on_prediction: Box<dyn FnMut(&[f32], u32) + Send>,
    on_bar_end: Box<dyn FnMut() + Send>,
    update_temperature: Box<dyn FnMut(f32) -> f32 + Send>,
    is_cancelled: Box<dyn FnMut() -> bool + Send>,
}

impl Default for CallbackManager {
    fn default() -> Self {
        Self {
            on_start: Box::new(|| {}),
            on_prediction: Box::new(|_, _| {}),
            on_bar_end: Box::new(|| {}),
            update_temperature: Box::new(|t| t),
            is_cancelled: Box::new(|| false),
        }
    }
}

impl CallbackManager {
    /// A manager with every hook a no-op.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook invoked once before the first model forward.
    #[must_use]
    pub fn with_on_start(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_start = Box::new(f);
        self
    }

    /// Sets the hook invoked after every sampled token with its logits.
    #[must_use]
    pub fn with_on_prediction(mut self, f: impl FnMut(&[f32], u32) + Send + 'static) -> Self {
        self.on_prediction = Box::new(f);
        self
    }

    /// Sets the hook invoked whenever a `BAR_END` token is emitted.
    #[must_use]
    pub fn with_on_bar_end(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_bar_end = Box::new(f);
        self
    }

    /// Sets the hook that may raise or lower temperature between attempts.
    #[must_use]
    pub fn with_update_temperature(mut self, f: impl FnMut(f32) -> f32 + Send + 'static) -> Self {
        self.update_temperature = Box::new(f);
        self
    }

    /// Sets the cooperative cancellation poll.
    #[must_use]
    pub fn with_is_cancelled(mut self, f: impl FnMut() -> bool + Send + 'static) -> Self {
        self.is_cancelled = Box::new(f);
        self
    }

    pub(crate) fn start(&mut self) {
        (self.on_start)();
    }

    pub(crate) fn prediction(&mut self, logits: &[f32], token: u32) {
        (self.on_prediction)(logits, token);
    }

    pub(crate) fn bar_end(&mut self) {
        (self.on_bar_end)();
    }

    pub(crate) fn temperature(&mut self, current: f32) -> f32 {
        (self.update_temperature)(current)
    }

    pub(crate) fn cancelled(&mut self) -> bool {
        (self.is_cancelled)()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn defaults_are_no_ops_and_never_cancel() {
        let mut cb = CallbackManager::new();
        cb.start();
        cb.prediction(&[0.0, 1.0], 1);
        cb.bar_end();
        assert!((cb.temperature(0.8) - 0.8).abs() < 1e-9);
        assert!(!cb.cancelled());
    }

    #[test]
    fn hooks_fire_when_set() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut cb = CallbackManager::new().with_on_bar_end(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        cb.bar_end();
        cb.bar_end();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
