//! # fauxplug-domain
//!
//! Pure domain model for the fauxplug smart-plug emulator.
//!
//! ## Responsibilities
//! - Derive the stable identity of an emulated switch from its display name
//!   (serial number, persistent id, UDN)
//! - Define the **relay state** a switch reports and the state changes it accepts
//! - Define colour and brightness value objects consumed by lighting handlers
//! - Render the HTTP `Date` header from an optional wall-clock reading
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod color;
pub mod device;
pub mod relay;
