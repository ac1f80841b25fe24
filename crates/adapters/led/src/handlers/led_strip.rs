//! Handler filling the shared strip with one colour.

use std::sync::{MutexGuard, PoisonError};

use fauxplug_app::ports::{ActionHandler, SharedStrip, StripDriver};
use fauxplug_domain::color::{Brightness, Rgb};

/// Lights the whole strip in a fixed colour on `on`, blanks it on `off`.
///
/// Every switch using this handler drives the same strip. Brightness is
/// global to the strip and applied once, when the handler is built, so the
/// last handler built decides it.
pub struct LedStripHandler<S> {
    strip: SharedStrip<S>,
    color: Rgb,
}

impl<S: StripDriver> LedStripHandler<S> {
    #[must_use]
    pub fn new(strip: SharedStrip<S>, color: Rgb, brightness: Brightness) -> Self {
        let handler = Self { strip, color };
        handler.lock().set_brightness(brightness);
        handler
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.strip.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fill(&self, color: Rgb) {
        let mut strip = self.lock();
        let frame = vec![color; strip.pixel_count()];
        strip.render(&frame);
    }
}

impl<S: StripDriver> ActionHandler for LedStripHandler<S> {
    fn on(&mut self) -> bool {
        tracing::debug!(color = ?self.color, "strip on");
        self.fill(self.color);
        true
    }

    fn off(&mut self) -> bool {
        tracing::debug!("strip off");
        self.fill(Rgb::BLACK);
        true
    }
}

impl<S> std::fmt::Debug for LedStripHandler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedStripHandler")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}
