//! # fauxplug-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `ActionHandler`: the on/off capability a switch delegates to
//!   - `Clock`: wall-clock reading for `Date` headers
//!   - `StripDriver`: the LED strip consumed by lighting handlers
//! - Implement the fixed **protocol surface**: request classification,
//!   description documents, SOAP envelopes, HTTP and SSDP responses
//! - Provide the use-case services:
//!   - `SwitchService`: answers control requests for one emulated switch
//!   - `DiscoveryService`: decides which search probes get a reply burst
//!
//! ## Dependency rule
//! Depends on `fauxplug-domain` only. Never touches a socket: the net
//! adapter reads bytes, hands them to these services, and writes back
//! whatever they return.

pub mod ports;
pub mod protocol;
pub mod services;
