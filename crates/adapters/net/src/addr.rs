//! Choosing the address switches advertise in `LOCATION`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use crate::config::{SSDP_MULTICAST_ADDR, SSDP_PORT};

/// Pick the IP searchers should use to reach the control listeners.
///
/// An explicit address wins. Otherwise a specific listen address is used
/// as-is. With a wildcard listen address, the interface the host would
/// route multicast traffic through is used, falling back to loopback.
#[must_use]
pub fn resolve_advertise_ip(explicit: Option<IpAddr>, listen: IpAddr) -> IpAddr {
    if let Some(ip) = explicit {
        return ip;
    }
    if !listen.is_unspecified() {
        return listen;
    }
    match outbound_ip() {
        Some(ip) => ip,
        None => {
            tracing::warn!("could not determine a routable address, advertising loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

/// Local address of a UDP socket connected toward the SSDP group. No
/// datagram is sent.
fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket
        .connect(SocketAddr::from((SSDP_MULTICAST_ADDR, SSDP_PORT)))
        .ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_prefer_explicit_address() {
        let explicit = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5));
        let listen = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(resolve_advertise_ip(Some(explicit), listen), explicit);
    }

    #[test]
    fn should_use_specific_listen_address() {
        let listen = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(resolve_advertise_ip(None, listen), listen);
    }

    #[test]
    fn should_never_advertise_wildcard() {
        let ip = resolve_advertise_ip(None, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(!ip.is_unspecified());
    }
}
