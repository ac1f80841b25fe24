//! # fauxplug-adapter-net
//!
//! Socket adapter: everything that touches the network.
//!
//! ## Responsibilities
//! - [`multiplexer`]: one watch set over every socket, level-triggered
//! - [`device`]: a switch's control listener and its accepted connections
//! - [`discovery`]: the SSDP socket and paced reply bursts
//! - [`emulator`]: the event loop dispatching readiness to its owner
//!
//! Protocol decisions live in `fauxplug-app`; this crate only moves bytes.
//! Unix only, readiness comes from `tokio::io::unix::AsyncFd`.

pub mod addr;
pub mod config;
pub mod device;
pub mod discovery;
pub mod emulator;
pub mod error;
pub mod multiplexer;

pub use addr::resolve_advertise_ip;
pub use config::{DiscoveryConfig, EmulatorConfig};
pub use emulator::{Emulator, Owner};
pub use error::NetError;
