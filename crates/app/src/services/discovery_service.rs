//! Discovery service: decides which SSDP probes get answered and by whom.
//!
//! The service owns the discovery registry (every switch, in registration
//! order) and the in-flight guard that keeps overlapping probes from
//! triggering overlapping reply bursts. Sending is left to the net adapter.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fauxplug_domain::device::DeviceIdentity;
use uuid::Uuid;

use crate::protocol::USER_AGENT_HEADER;
use crate::protocol::response::SearchResponse;

const SEARCH_METHOD: &[u8] = b"M-SEARCH";

/// Search targets that trigger a reply.
const RECOGNIZED_TARGETS: [&[u8]; 3] = [b"upnp:rootdevice", b"ssdp:all", b"urn:Belkin:device:**"];

/// Whether a datagram is a search probe this emulator answers.
#[must_use]
pub fn is_search_probe(payload: &[u8]) -> bool {
    payload.starts_with(SEARCH_METHOD)
        && RECOGNIZED_TARGETS.iter().any(|target| {
            payload
                .windows(target.len())
                .any(|window| window == *target)
        })
}

/// What a registered switch announces when it answers a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    pub name: String,
    /// URL of the switch's `setup.xml`.
    pub location: String,
    pub persistent_id: String,
    pub extra_headers: Vec<String>,
}

impl Advertisement {
    /// Advertisement for a switch reachable at `ip:port`.
    #[must_use]
    pub fn for_switch(identity: &DeviceIdentity, ip: IpAddr, port: u16) -> Self {
        Self {
            name: identity.name().to_string(),
            location: format!("http://{}/setup.xml", SocketAddr::new(ip, port)),
            persistent_id: identity.persistent_id(),
            extra_headers: vec![USER_AGENT_HEADER.to_string()],
        }
    }

    /// Render the unicast search response for this switch.
    #[must_use]
    pub fn render(&self, boot_id: &Uuid, date: &str) -> String {
        SearchResponse {
            location: &self.location,
            persistent_id: &self.persistent_id,
            boot_id: &boot_id.to_string(),
            extra_headers: &self.extra_headers,
            date,
        }
        .render()
    }
}

/// Registry of advertised switches plus the reply-burst guard.
#[derive(Debug)]
pub struct DiscoveryService {
    registry: Vec<Advertisement>,
    in_flight: Arc<AtomicBool>,
    boot_id: Uuid,
}

impl Default for DiscoveryService {
    fn default() -> Self {
        Self::with_boot_id(Uuid::new_v4())
    }
}

impl DiscoveryService {
    /// Create an empty registry with a fresh boot id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with a known boot id.
    #[must_use]
    pub fn with_boot_id(boot_id: Uuid) -> Self {
        Self {
            registry: Vec::new(),
            in_flight: Arc::new(AtomicBool::new(false)),
            boot_id,
        }
    }

    /// Register a switch. Registration order is reply order.
    pub fn add_device(&mut self, advertisement: Advertisement) {
        tracing::debug!(device = %advertisement.name, "registered for discovery");
        self.registry.push(advertisement);
    }

    #[must_use]
    pub fn devices(&self) -> &[Advertisement] {
        &self.registry
    }

    /// Identifier sent as `01-NLS`, stable for the process lifetime.
    #[must_use]
    pub fn boot_id(&self) -> Uuid {
        self.boot_id
    }

    /// Whether a reply burst is currently being sent.
    #[must_use]
    pub fn is_replying(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Inspect one datagram and, when it is a recognised probe and no burst
    /// is in flight, return the burst to send back to `sender`.
    ///
    /// The guard stays held until the returned [`ReplyBurst`] is dropped.
    #[tracing::instrument(skip(self, payload))]
    pub fn on_datagram(&self, payload: &[u8], sender: SocketAddr) -> Option<ReplyBurst> {
        if !is_search_probe(payload) {
            return None;
        }
        if self.registry.is_empty() {
            tracing::debug!("search probe received with no registered switch");
            return None;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("reply burst already in flight, ignoring probe");
            return None;
        }
        tracing::info!(count = self.registry.len(), "answering search probe");
        Some(ReplyBurst {
            destination: sender,
            replies: self.registry.clone(),
            boot_id: self.boot_id,
            _guard: InFlightGuard(Arc::clone(&self.in_flight)),
        })
    }
}

/// Replies owed to one searcher, one per registered switch.
#[derive(Debug)]
pub struct ReplyBurst {
    destination: SocketAddr,
    replies: Vec<Advertisement>,
    boot_id: Uuid,
    _guard: InFlightGuard,
}

impl ReplyBurst {
    /// Address the probe came from.
    #[must_use]
    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.replies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    /// Switches to answer for, in registration order.
    pub fn replies(&self) -> impl Iterator<Item = &Advertisement> {
        self.replies.iter()
    }

    /// Render the reply of the switch at `index` with the given `Date`.
    #[must_use]
    pub fn render(&self, index: usize, date: &str) -> Option<String> {
        self.replies
            .get(index)
            .map(|advertisement| advertisement.render(&self.boot_id, date))
    }
}

/// Releases the in-flight flag once the burst is over.
#[derive(Debug)]
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const PROBE: &[u8] = b"M-SEARCH * HTTP/1.1\r\n\
        HOST: 239.255.255.250:1900\r\n\
        MAN: \"ssdp:discover\"\r\n\
        MX: 15\r\n\
        ST: urn:Belkin:device:**\r\n\r\n";

    fn sender() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::new(192, 168, 1, 50), 50_000))
    }

    fn service(names: &[&str]) -> DiscoveryService {
        let mut service = DiscoveryService::with_boot_id(Uuid::nil());
        for (offset, name) in (0u16..).zip(names) {
            let identity = DeviceIdentity::new(*name).unwrap();
            service.add_device(Advertisement::for_switch(
                &identity,
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
                12_340 + offset,
            ));
        }
        service
    }

    #[test]
    fn should_recognise_each_search_target() {
        for st in ["upnp:rootdevice", "ssdp:all", "urn:Belkin:device:**"] {
            let probe = format!("M-SEARCH * HTTP/1.1\r\nST: {st}\r\n\r\n");
            assert!(is_search_probe(probe.as_bytes()), "target {st}");
        }
    }

    #[test]
    fn should_ignore_other_targets_and_methods() {
        assert!(!is_search_probe(
            b"M-SEARCH * HTTP/1.1\r\nST: urn:dial-multiscreen-org:service:dial:1\r\n\r\n"
        ));
        assert!(!is_search_probe(
            b"NOTIFY * HTTP/1.1\r\nNT: upnp:rootdevice\r\n\r\n"
        ));
    }

    #[test]
    fn should_answer_for_every_switch_in_registration_order() {
        let service = service(&["kitchen", "red led", "led"]);
        let burst = service.on_datagram(PROBE, sender()).unwrap();

        assert_eq!(burst.destination(), sender());
        let names: Vec<_> = burst.replies().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["kitchen", "red led", "led"]);

        let first = burst.render(0, "date").unwrap();
        assert!(first.contains("LOCATION: http://192.168.1.20:12340/setup.xml\r\n"));
        assert!(first.contains("USN: uuid:Socket-1_0-2e66b697463686::urn:Belkin:device:**\r\n"));
        assert!(first.contains("01-NLS: 00000000-0000-0000-0000-000000000000\r\n"));
        assert!(burst.render(3, "date").is_none());
    }

    #[test]
    fn should_ignore_overlapping_probe_while_burst_in_flight() {
        let service = service(&["a", "b", "c"]);
        let burst = service.on_datagram(PROBE, sender());
        assert!(burst.is_some());
        assert!(service.is_replying());

        assert!(service.on_datagram(PROBE, sender()).is_none());
    }

    #[test]
    fn should_answer_again_once_burst_completes() {
        let service = service(&["a", "b", "c"]);
        let burst = service.on_datagram(PROBE, sender()).unwrap();
        drop(burst);

        assert!(!service.is_replying());
        let again = service.on_datagram(PROBE, sender()).unwrap();
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn should_not_latch_guard_for_ignored_datagrams() {
        let service = service(&["a"]);
        assert!(service.on_datagram(b"garbage", sender()).is_none());
        assert!(!service.is_replying());
    }

    #[test]
    fn should_not_answer_without_registered_switches() {
        let service = DiscoveryService::new();
        assert!(service.on_datagram(PROBE, sender()).is_none());
        assert!(!service.is_replying());
    }
}
