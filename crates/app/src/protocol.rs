//! The fixed HTTP/SOAP and SSDP surface a voice assistant expects from a
//! Belkin-compatible switch.
//!
//! Only the handful of requests the assistant actually sends are recognised;
//! this is not a general HTTP or UPnP implementation.

pub mod request;
pub mod response;
pub mod templates;

/// `SERVER` banner sent in every response.
pub const SERVER_BANNER: &str = "Unspecified, UPnP/1.0, Unspecified";

/// Extra header the assistant checks on every reply.
pub const USER_AGENT_HEADER: &str = "X-User-Agent: redsonic";

/// Search target used in every discovery reply.
pub const SEARCH_TARGET: &str = "urn:Belkin:device:**";
