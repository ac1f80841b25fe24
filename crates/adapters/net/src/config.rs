//! Event-loop and discovery configuration.

use std::net::Ipv4Addr;
use std::time::Duration;

use serde::Deserialize;

/// Standard SSDP multicast group.
pub const SSDP_MULTICAST_ADDR: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Standard SSDP port.
pub const SSDP_PORT: u16 = 1900;

/// Configuration for the control side of the event loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Upper bound of one multiplexer wait, in milliseconds.
    pub poll_timeout_ms: u64,
    /// Hard cap of simultaneously open connections per switch.
    pub max_connections: usize,
}

impl EmulatorConfig {
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 10,
            max_connections: 4,
        }
    }
}

/// Configuration for the SSDP responder.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Open the SSDP socket at all.
    pub enabled: bool,
    /// Multicast group to join.
    pub group: Ipv4Addr,
    /// UDP port to listen on.
    pub port: u16,
    /// Local interface used for the multicast membership.
    pub interface: Ipv4Addr,
    /// Delay before each unicast reply of a burst, in milliseconds.
    pub reply_pacing_ms: u64,
}

impl DiscoveryConfig {
    #[must_use]
    pub fn reply_pacing(&self) -> Duration {
        Duration::from_millis(self.reply_pacing_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            group: SSDP_MULTICAST_ADDR,
            port: SSDP_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            reply_pacing_ms: 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let emulator = EmulatorConfig::default();
        assert_eq!(emulator.poll_timeout(), Duration::from_millis(10));
        assert_eq!(emulator.max_connections, 4);

        let discovery = DiscoveryConfig::default();
        assert!(discovery.enabled);
        assert_eq!(discovery.group, Ipv4Addr::new(239, 255, 255, 250));
        assert_eq!(discovery.port, 1900);
        assert_eq!(discovery.reply_pacing(), Duration::from_millis(500));
    }

    #[test]
    fn should_deserialize_from_toml() {
        let toml = r#"
            enabled = false
            port = 1901
            interface = "192.168.1.20"
            reply_pacing_ms = 100
        "#;
        let config: DiscoveryConfig = toml::from_str(toml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.port, 1901);
        assert_eq!(config.interface, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(config.reply_pacing_ms, 100);
        assert_eq!(config.group, SSDP_MULTICAST_ADDR);
    }

    #[test]
    fn should_use_defaults_for_missing_fields() {
        let config: EmulatorConfig = toml::from_str("max_connections = 2").unwrap();
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.poll_timeout_ms, 10);
    }
}
