//! In-memory LED strip.

use fauxplug_app::ports::StripDriver;
use fauxplug_domain::color::{Brightness, Rgb};

/// A strip that keeps its last frame in memory instead of driving hardware.
#[derive(Debug, Clone)]
pub struct VirtualStrip {
    pixels: Vec<Rgb>,
    brightness: Brightness,
    renders: usize,
}

impl VirtualStrip {
    /// A dark strip of `length` pixels at full brightness.
    #[must_use]
    pub fn new(length: usize) -> Self {
        Self {
            pixels: vec![Rgb::BLACK; length],
            brightness: Brightness::default(),
            renders: 0,
        }
    }

    /// Last rendered frame.
    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    #[must_use]
    pub fn brightness(&self) -> Brightness {
        self.brightness
    }

    /// How many frames were rendered so far.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Whether any pixel of the last frame is lit.
    #[must_use]
    pub fn is_lit(&self) -> bool {
        self.pixels.iter().any(|pixel| *pixel != Rgb::BLACK)
    }
}

impl StripDriver for VirtualStrip {
    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn set_brightness(&mut self, level: Brightness) {
        tracing::debug!(brightness = level.percent(), "strip brightness set");
        self.brightness = level;
    }

    fn render(&mut self, pixels: &[Rgb]) {
        // Extra input pixels fall off the end; missing ones go dark.
        for (slot, pixel) in self.pixels.iter_mut().enumerate() {
            *pixel = pixels.get(slot).copied().unwrap_or(Rgb::BLACK);
        }
        self.renders += 1;
        tracing::debug!(
            pixels = self.pixels.len(),
            lit = self.is_lit(),
            brightness = self.brightness.percent(),
            "strip rendered"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_dark_at_full_brightness() {
        let strip = VirtualStrip::new(8);
        assert_eq!(strip.pixel_count(), 8);
        assert!(!strip.is_lit());
        assert_eq!(strip.brightness(), Brightness::MAX);
        assert_eq!(strip.render_count(), 0);
    }

    #[test]
    fn should_keep_last_frame() {
        let mut strip = VirtualStrip::new(3);
        let red = Rgb::new(255, 0, 0);
        strip.render(&[red; 3]);
        assert_eq!(strip.pixels(), &[red; 3]);
        assert!(strip.is_lit());
        assert_eq!(strip.render_count(), 1);
    }

    #[test]
    fn should_fit_frame_to_strip_length() {
        let mut strip = VirtualStrip::new(3);
        let green = Rgb::new(0, 255, 0);
        strip.render(&[green; 5]);
        assert_eq!(strip.pixels(), &[green; 3]);

        strip.render(&[green]);
        assert_eq!(strip.pixels(), &[green, Rgb::BLACK, Rgb::BLACK]);
    }
}
