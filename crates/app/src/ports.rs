//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the services and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod action;
pub mod clock;
pub mod strip;

pub use action::{ActionHandler, UnconfiguredHandler};
pub use clock::{Clock, FixedClock, SystemClock};
pub use strip::{SharedStrip, StripDriver};
