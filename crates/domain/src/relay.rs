//! Relay state: the on/off value a switch reports as `BinaryState`.

use serde::{Deserialize, Serialize};

/// Binary state of an emulated relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    On,
    #[default]
    Off,
}

impl RelayState {
    /// The `BinaryState` digit: `'1'` for on, `'0'` for off.
    #[must_use]
    pub fn binary_digit(self) -> char {
        match self {
            Self::On => '1',
            Self::Off => '0',
        }
    }
}

impl std::fmt::Display for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_off() {
        assert_eq!(RelayState::default(), RelayState::Off);
    }

    #[test]
    fn should_render_binary_digits() {
        assert_eq!(RelayState::On.binary_digit(), '1');
        assert_eq!(RelayState::Off.binary_digit(), '0');
    }

    #[test]
    fn should_display_lowercase_variant_name() {
        assert_eq!(RelayState::On.to_string(), "on");
        assert_eq!(RelayState::Off.to_string(), "off");
    }
}
