//! LED strip port: the process-wide pixel chain driven by lighting handlers.

use std::sync::{Arc, Mutex};

use fauxplug_domain::color::{Brightness, Rgb};

/// Driver for an addressable LED strip.
pub trait StripDriver: Send {
    /// Number of pixels on the strip.
    fn pixel_count(&self) -> usize;

    /// Set the global brightness applied to every subsequent render.
    fn set_brightness(&mut self, level: Brightness);

    /// Push one colour per pixel to the strip.
    fn render(&mut self, pixels: &[Rgb]);
}

/// A strip shared by every handler that drives it.
///
/// Handlers only run inside the single event loop, so the lock is never
/// contended; it exists so the strip stays sound if handlers ever run
/// concurrently.
pub type SharedStrip<S> = Arc<Mutex<S>>;
