//! Handler toggling a single on/off output, such as a status LED.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fauxplug_app::ports::ActionHandler;

/// Drives one binary output. Both transitions always succeed.
#[derive(Debug, Clone, Default)]
pub struct IndicatorHandler {
    output: Arc<AtomicBool>,
}

impl IndicatorHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of the output.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.output.load(Ordering::Relaxed)
    }

    fn set(&self, lit: bool) {
        self.output.store(lit, Ordering::Relaxed);
        tracing::debug!(lit, "indicator set");
    }
}

impl ActionHandler for IndicatorHandler {
    fn on(&mut self) -> bool {
        self.set(true);
        true
    }

    fn off(&mut self) -> bool {
        self.set(false);
        true
    }
}
