//! Virtual device: the socket side of one emulated switch.
//!
//! Owns the switch's listening socket and its table of accepted
//! connections. Request bytes are handed to the [`SwitchService`]; whatever
//! it answers is written back on the same connection, which then stays open
//! until the peer closes it. Writes never wait: a peer whose receive side is
//! full loses its connection.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::Arc;

use fauxplug_app::services::discovery_service::{Advertisement, DiscoveryService};
use fauxplug_app::services::switch_service::SwitchService;
use socket2::{Domain, Protocol, Socket, Type};

use crate::emulator::Owner;
use crate::error::NetError;
use crate::multiplexer::{Handle, Multiplexer, Source};

/// Bytes read per readable event. Larger requests are not reassembled.
pub const READ_BUFFER_SIZE: usize = 4096;

/// Pending-connection backlog of each control listener.
const LISTEN_BACKLOG: i32 = 5;

/// One discoverable, controllable switch endpoint.
pub struct VirtualDevice {
    index: usize,
    switch: SwitchService,
    address: SocketAddr,
    listener: Arc<Source>,
    listener_handle: Handle,
    connections: HashMap<Handle, Arc<Source>>,
    max_connections: usize,
}

impl VirtualDevice {
    /// Bind the control listener on `addr`, watch it, and register the
    /// switch for discovery.
    ///
    /// With port 0 the kernel-assigned port is captured right after bind
    /// and kept for the device's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Bind`] when the listener cannot be opened.
    pub fn bind(
        index: usize,
        switch: SwitchService,
        addr: SocketAddr,
        advertise_ip: IpAddr,
        max_connections: usize,
        mux: &mut Multiplexer<Owner>,
        discovery: &mut DiscoveryService,
    ) -> Result<Self, NetError> {
        let bind_err = |source| NetError::Bind { addr, source };
        let listener = open_listener(addr).map_err(bind_err)?;
        let listener = Arc::new(Source::listener(listener).map_err(bind_err)?);
        let address = listener.local_addr().map_err(bind_err)?;

        let listener_handle = mux.allocate();
        mux.register(listener_handle, Arc::clone(&listener), Owner::Listener(index))?;

        discovery.add_device(Advertisement::for_switch(
            switch.identity(),
            advertise_ip,
            address.port(),
        ));

        tracing::info!(
            device = %switch.identity().name(),
            serial = %switch.identity().serial(),
            %address,
            "switch ready"
        );

        Ok(Self {
            index,
            switch,
            address,
            listener,
            listener_handle,
            connections: HashMap::new(),
            max_connections,
        })
    }

    /// Address the control listener is bound to, with the final port.
    #[must_use]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    #[must_use]
    pub fn switch(&self) -> &SwitchService {
        &self.switch
    }

    /// Number of accepted connections currently open.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Handle a readiness event on the listener or one of the connections.
    ///
    /// # Errors
    ///
    /// Accept, read and write failures are returned for the caller to log;
    /// the device stays usable after any of them.
    pub async fn on_readable(
        &mut self,
        handle: Handle,
        mux: &mut Multiplexer<Owner>,
    ) -> Result<(), NetError> {
        if handle == self.listener_handle {
            self.accept(mux).await
        } else {
            self.serve(handle, mux).await
        }
    }

    async fn accept(&mut self, mux: &mut Multiplexer<Owner>) -> Result<(), NetError> {
        let (stream, peer) = self.listener.accept().await.map_err(NetError::Accept)?;
        if self.connections.len() >= self.max_connections {
            tracing::warn!(
                device = %self.switch.identity().name(),
                %peer,
                limit = self.max_connections,
                "connection limit reached, refusing"
            );
            return Ok(());
        }
        let source = Arc::new(Source::stream(stream).map_err(NetError::Accept)?);
        let handle = mux.allocate();
        mux.register(handle, Arc::clone(&source), Owner::Connection(self.index))?;
        self.connections.insert(handle, source);
        tracing::debug!(device = %self.switch.identity().name(), %peer, %handle, "accepted");
        Ok(())
    }

    async fn serve(&mut self, handle: Handle, mux: &mut Multiplexer<Owner>) -> Result<(), NetError> {
        let connection = self
            .connections
            .get(&handle)
            .cloned()
            .ok_or(NetError::UnknownConnection(handle))?;

        let mut buf = [0u8; READ_BUFFER_SIZE];
        let read = match connection.read(&mut buf).await {
            Ok(read) => read,
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
            Err(err) => {
                self.close(handle, mux)?;
                return Err(NetError::Read(err));
            }
        };

        if read == 0 {
            tracing::debug!(device = %self.switch.identity().name(), %handle, "peer closed");
            return self.close(handle, mux);
        }

        let Some(response) = self.switch.handle_request(&buf[..read]) else {
            return Ok(());
        };
        match connection.try_write_all(response.as_bytes()) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.close(handle, mux)?;
                if err.kind() == std::io::ErrorKind::WouldBlock {
                    Err(NetError::StalledPeer(handle))
                } else {
                    Err(NetError::Write(err))
                }
            }
        }
    }

    fn close(&mut self, handle: Handle, mux: &mut Multiplexer<Owner>) -> Result<(), NetError> {
        self.connections.remove(&handle);
        mux.unregister(handle)?;
        Ok(())
    }
}

impl std::fmt::Debug for VirtualDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualDevice")
            .field("index", &self.index)
            .field("switch", &self.switch)
            .field("address", &self.address)
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

fn open_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}
