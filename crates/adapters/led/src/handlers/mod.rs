//! Action handlers provided by this adapter.

mod indicator;
mod led_strip;

pub use indicator::IndicatorHandler;
pub use led_strip::LedStripHandler;
