//! # fauxplug-adapter-led
//!
//! Lighting adapter: what a switch actually does when it is toggled.
//!
//! ## Provided handlers
//!
//! | Handler | `on` | `off` |
//! |---------|------|-------|
//! | [`LedStripHandler`] | fills the whole strip with its colour | blanks the strip |
//! | [`IndicatorHandler`] | raises a single output | lowers it |
//!
//! [`VirtualStrip`] is the in-memory [`StripDriver`] the handlers drive
//! when no hardware is attached.
//!
//! ## Dependency rule
//!
//! Depends on `fauxplug-app` (port traits) and `fauxplug-domain` only.
//!
//! [`StripDriver`]: fauxplug_app::ports::StripDriver

pub mod config;
mod handlers;
mod strip;

pub use config::StripConfig;
pub use handlers::{IndicatorHandler, LedStripHandler};
pub use strip::VirtualStrip;
