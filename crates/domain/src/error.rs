//! Domain error types.
//!
//! Each layer defines its own typed errors; this one only covers invariants
//! of the value objects.

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A switch must have a non-empty display name.
    #[error("name must not be empty")]
    EmptyName,

    /// Brightness is expressed as a percentage.
    #[error("brightness {0} is outside 0..=100")]
    BrightnessOutOfRange(u8),
}
