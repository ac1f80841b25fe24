//! LED strip configuration.

use serde::Deserialize;

/// Default strip length, one metre of 144 LED/m tape.
pub const DEFAULT_STRIP_LENGTH: usize = 144;

/// Configuration for the shared LED strip.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Number of pixels on the strip.
    pub length: usize,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_STRIP_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_one_metre_strip() {
        assert_eq!(StripConfig::default().length, 144);
    }

    #[test]
    fn should_deserialize_length() {
        let config: StripConfig = toml::from_str("length = 30").unwrap();
        assert_eq!(config.length, 30);
    }
}
