//! The single-threaded event loop tying switches and discovery together.
//!
//! One [`Multiplexer`] watches the SSDP socket, every control listener and
//! every accepted connection. Each [`Emulator::turn`] waits once and
//! dispatches every ready socket to its owner. Nothing here blocks for long:
//! reply bursts run as separate tasks so their pacing never stalls control
//! requests.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use fauxplug_app::ports::Clock;
use fauxplug_app::services::discovery_service::DiscoveryService;
use fauxplug_app::services::switch_service::SwitchService;

use crate::config::{DiscoveryConfig, EmulatorConfig};
use crate::device::VirtualDevice;
use crate::discovery::{DiscoverySocket, send_burst};
use crate::error::NetError;
use crate::multiplexer::{Handle, Multiplexer};

/// Who a watched socket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// The SSDP socket.
    Discovery,
    /// The control listener of the switch at this index.
    Listener(usize),
    /// A connection accepted by the switch at this index.
    Connection(usize),
}

/// Every emulated switch plus the discovery responder.
pub struct Emulator {
    mux: Multiplexer<Owner>,
    discovery: DiscoveryService,
    discovery_socket: Option<DiscoverySocket>,
    devices: Vec<VirtualDevice>,
    clock: Arc<dyn Clock>,
    config: EmulatorConfig,
    discovery_config: DiscoveryConfig,
}

impl Emulator {
    /// Create the loop and, when enabled, open the SSDP socket.
    ///
    /// Failing to open the SSDP socket is not fatal: switches stay
    /// controllable, they just cannot be discovered.
    #[must_use]
    pub fn new(
        config: EmulatorConfig,
        discovery_config: DiscoveryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut mux = Multiplexer::new();
        let discovery_socket = if discovery_config.enabled {
            match DiscoverySocket::open(&discovery_config, &mut mux) {
                Ok(socket) => Some(socket),
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        cause = ?std::error::Error::source(&err),
                        "discovery unavailable, switches will not be found by search"
                    );
                    None
                }
            }
        } else {
            tracing::info!("discovery disabled");
            None
        };

        Self {
            mux,
            discovery: DiscoveryService::new(),
            discovery_socket,
            devices: Vec::new(),
            clock,
            config,
            discovery_config,
        }
    }

    /// Bind a control listener for `switch` on `addr` and advertise it as
    /// reachable at `advertise_ip`. Returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Bind`] when the listener cannot be opened; the
    /// switch is then neither watched nor advertised.
    pub fn add_switch(
        &mut self,
        switch: SwitchService,
        addr: SocketAddr,
        advertise_ip: IpAddr,
    ) -> Result<SocketAddr, NetError> {
        let device = VirtualDevice::bind(
            self.devices.len(),
            switch,
            addr,
            advertise_ip,
            self.config.max_connections,
            &mut self.mux,
            &mut self.discovery,
        )?;
        let address = device.address();
        self.devices.push(device);
        Ok(address)
    }

    #[must_use]
    pub fn devices(&self) -> &[VirtualDevice] {
        &self.devices
    }

    #[must_use]
    pub fn discovery(&self) -> &DiscoveryService {
        &self.discovery
    }

    /// Whether the SSDP socket is open.
    #[must_use]
    pub fn is_discoverable(&self) -> bool {
        self.discovery_socket.is_some()
    }

    /// Wait once and dispatch every ready socket. Returns how many sockets
    /// were ready; zero means the wait timed out.
    pub async fn turn(&mut self) -> usize {
        let ready = self.mux.wait(self.config.poll_timeout()).await;
        let count = ready.len();
        for (handle, owner) in ready {
            if let Err(err) = self.dispatch(handle, owner).await {
                if err.is_would_block() {
                    tracing::debug!(%handle, ?owner, "socket reported ready with nothing to do");
                } else {
                    tracing::warn!(
                        error = %err,
                        cause = ?std::error::Error::source(&err),
                        %handle,
                        ?owner,
                        "failed to handle socket event"
                    );
                }
            }
        }
        count
    }

    /// Run the loop until the task is cancelled.
    pub async fn run(&mut self) {
        tracing::info!(
            switches = self.devices.len(),
            discoverable = self.is_discoverable(),
            "emulator running"
        );
        loop {
            self.turn().await;
        }
    }

    async fn dispatch(&mut self, handle: Handle, owner: Owner) -> Result<(), NetError> {
        match owner {
            Owner::Discovery => self.on_discovery_readable().await,
            Owner::Listener(index) | Owner::Connection(index) => {
                let device = self
                    .devices
                    .get_mut(index)
                    .ok_or(NetError::UnknownConnection(handle))?;
                device.on_readable(handle, &mut self.mux).await
            }
        }
    }

    async fn on_discovery_readable(&self) -> Result<(), NetError> {
        let Some(socket) = &self.discovery_socket else {
            return Ok(());
        };
        let (payload, sender) = socket.receive().await?;
        let Some(burst) = self.discovery.on_datagram(&payload, sender) else {
            return Ok(());
        };
        let pacing = self.discovery_config.reply_pacing();
        let clock = Arc::clone(&self.clock);
        tokio::spawn(async move {
            if let Err(err) = send_burst(burst, pacing, clock).await {
                tracing::warn!(%err, %sender, "failed to send search replies");
            }
        });
        Ok(())
    }
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("devices", &self.devices)
            .field("discovery", &self.discovery)
            .field("discoverable", &self.discovery_socket.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use fauxplug_app::ports::{ActionHandler, FixedClock};
    use fauxplug_domain::device::DeviceIdentity;
    use fauxplug_domain::relay::RelayState;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const SET_ON: &[u8] = b"POST /upnp/control/basicevent1 HTTP/1.1\r\n\
        Host: 127.0.0.1\r\n\
        SOAPACTION: \"urn:Belkin:service:basicevent:1#SetBinaryState\"\r\n\
        Content-Type: text/xml\r\n\r\n\
        <s:Envelope><s:Body><u:SetBinaryState><BinaryState>1</BinaryState>\
        </u:SetBinaryState></s:Body></s:Envelope>";

    fn emulator() -> Emulator {
        let config = EmulatorConfig {
            poll_timeout_ms: 20,
            max_connections: 4,
        };
        let discovery = DiscoveryConfig {
            enabled: false,
            ..DiscoveryConfig::default()
        };
        Emulator::new(config, discovery, Arc::new(FixedClock(None)))
    }

    struct AlwaysOn;

    impl ActionHandler for AlwaysOn {
        fn on(&mut self) -> bool {
            true
        }

        fn off(&mut self) -> bool {
            true
        }
    }

    fn switch(name: &str) -> SwitchService {
        SwitchService::new(
            DeviceIdentity::new(name).unwrap(),
            None,
            Arc::new(FixedClock(None)),
        )
    }

    fn working_switch(name: &str) -> SwitchService {
        SwitchService::new(
            DeviceIdentity::new(name).unwrap(),
            Some(Box::new(AlwaysOn)),
            Arc::new(FixedClock(None)),
        )
    }

    fn loopback() -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
    }

    #[tokio::test]
    async fn should_run_without_discovery_when_disabled() {
        let emulator = emulator();
        assert!(!emulator.is_discoverable());
        assert!(emulator.devices().is_empty());
    }

    #[tokio::test]
    async fn should_register_switches_in_order() {
        let mut emulator = emulator();
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let first = emulator.add_switch(switch("red led"), loopback(), ip).unwrap();
        let second = emulator.add_switch(switch("blue led"), loopback(), ip).unwrap();

        assert_ne!(first.port(), second.port());
        let names: Vec<_> = emulator
            .discovery()
            .devices()
            .iter()
            .map(|ad| ad.name.as_str())
            .collect();
        assert_eq!(names, ["red led", "blue led"]);
    }

    #[tokio::test]
    async fn should_time_out_when_idle() {
        let mut emulator = emulator();
        emulator
            .add_switch(switch("led"), loopback(), IpAddr::V4(Ipv4Addr::LOCALHOST))
            .unwrap();
        assert_eq!(emulator.turn().await, 0);
    }

    #[tokio::test]
    async fn should_serve_requests_on_the_right_switch() {
        let mut emulator = emulator();
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        emulator.add_switch(switch("red led"), loopback(), ip).unwrap();
        let target = emulator
            .add_switch(working_switch("blue led"), loopback(), ip)
            .unwrap();

        let client = tokio::spawn(async move {
            let mut stream = tokio::net::TcpStream::connect(target).await.unwrap();
            stream.write_all(SET_ON).await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = tokio::time::timeout(Duration::from_secs(1), stream.read(&mut buf))
                .await
                .expect("no response from switch")
                .unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !client.is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "client never finished");
            emulator.turn().await;
        }
        let response = client.await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("<BinaryState>1</BinaryState>"));
        assert_eq!(emulator.devices()[1].switch().relay_state(), RelayState::On);
        assert_eq!(emulator.devices()[0].switch().relay_state(), RelayState::Off);
    }
}
