//! Device identity: the name-derived identifiers an emulated switch advertises.
//!
//! The discovering client caches switches by serial, so the derivation below
//! must stay bit-exact across releases.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of characters kept from the derived serial.
pub const SERIAL_LEN: usize = 14;

/// Salt appended to the name before hex-encoding it.
const SERIAL_SALT: &str = "Fauxmo!";

/// Prefix of the persistent id advertised in `USN` and `UDN` fields.
const PERSISTENT_ID_PREFIX: &str = "Socket-1_0-";

/// Derive the 14-character serial for a switch name.
///
/// 1. the sum of all character codes, as lowercase hex without padding;
/// 2. followed by the hex code of every character of `name + "Fauxmo!"`;
/// 3. truncated to [`SERIAL_LEN`] characters.
#[must_use]
pub fn make_serial(name: &str) -> String {
    let sum: u64 = name.chars().map(|c| u64::from(u32::from(c))).sum();
    let mut serial = format!("{sum:x}");
    for c in name.chars().chain(SERIAL_SALT.chars()) {
        if serial.len() >= SERIAL_LEN {
            break;
        }
        serial.push_str(&format!("{:x}", u32::from(c)));
    }
    serial.truncate(SERIAL_LEN);
    serial
}

/// Stable identity of one emulated switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    name: String,
    serial: String,
}

impl DeviceIdentity {
    /// Build the identity for a display name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let serial = make_serial(&name);
        Ok(Self { name, serial })
    }

    /// Display name shown to the discovering client.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name-derived serial, see [`make_serial`].
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// `Socket-1_0-<serial>`, used in discovery `USN` headers.
    #[must_use]
    pub fn persistent_id(&self) -> String {
        format!("{PERSISTENT_ID_PREFIX}{}", self.serial)
    }

    /// `uuid:Socket-1_0-<serial>`, the `UDN` of the description document.
    #[must_use]
    pub fn udn(&self) -> String {
        format!("uuid:{}", self.persistent_id())
    }
}
