//! SSDP socket: joins the multicast group and sends reply bursts.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use fauxplug_app::ports::Clock;
use fauxplug_app::services::discovery_service::ReplyBurst;
use fauxplug_domain::time::http_date;
use socket2::{Domain, Protocol, Socket, Type};

use crate::config::DiscoveryConfig;
use crate::emulator::Owner;
use crate::error::NetError;
use crate::multiplexer::{Multiplexer, Source};

/// Bytes read per datagram. Longer probes are truncated.
pub const DATAGRAM_BUFFER_SIZE: usize = 1024;

/// The watched SSDP listening socket.
#[derive(Debug)]
pub struct DiscoverySocket {
    source: Arc<Source>,
}

impl DiscoverySocket {
    /// Bind the SSDP port with address reuse, join the multicast group, and
    /// add the socket to the watch set.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Discovery`] when the socket cannot be bound or the
    /// group cannot be joined.
    pub fn open(config: &DiscoveryConfig, mux: &mut Multiplexer<Owner>) -> Result<Self, NetError> {
        let socket = open_multicast(config).map_err(NetError::Discovery)?;
        let source = Arc::new(Source::datagram(socket).map_err(NetError::Discovery)?);
        let handle = mux.allocate();
        mux.register(handle, Arc::clone(&source), Owner::Discovery)?;
        tracing::info!(
            group = %config.group,
            port = config.port,
            interface = %config.interface,
            "listening for search probes"
        );
        Ok(Self { source })
    }

    /// Read one pending datagram.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Read`], including `WouldBlock` when the queue is
    /// already drained.
    pub async fn receive(&self) -> Result<(Vec<u8>, SocketAddr), NetError> {
        let mut buf = [0u8; DATAGRAM_BUFFER_SIZE];
        let (len, sender) = self.source.recv_from(&mut buf).await.map_err(NetError::Read)?;
        Ok((buf[..len].to_vec(), sender))
    }
}

fn open_multicast(config: &DiscoveryConfig) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, config.port);
    socket.bind(&addr.into())?;
    socket.join_multicast_v4(&config.group, &config.interface)?;
    Ok(socket.into())
}

/// Send every reply of `burst` to the searcher, waiting `pacing` before each.
///
/// Replies go out from a fresh ephemeral socket, one datagram per switch in
/// registration order. The in-flight guard is released when the burst is
/// dropped at the end, whether or not every reply was sent.
///
/// # Errors
///
/// Fails on the first socket error; replies already sent stay sent.
pub async fn send_burst(
    burst: ReplyBurst,
    pacing: Duration,
    clock: Arc<dyn Clock>,
) -> io::Result<usize> {
    let socket = tokio::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    let destination = burst.destination();
    let mut sent = 0;
    for index in 0..burst.len() {
        tokio::time::sleep(pacing).await;
        let Some(reply) = burst.render(index, &http_date(clock.now())) else {
            break;
        };
        socket.send_to(reply.as_bytes(), destination).await?;
        sent += 1;
    }
    tracing::debug!(%destination, sent, "reply burst done");
    Ok(sent)
}
