//! Net adapter error types.

use std::io;
use std::net::SocketAddr;

use crate::multiplexer::{Handle, MultiplexerError};

/// Errors specific to the socket adapter.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// A control listener could not be opened.
    #[error("failed to bind control listener on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The SSDP socket could not be opened or could not join the group.
    #[error("failed to set up discovery socket")]
    Discovery(#[source] io::Error),

    /// Accepting a pending connection failed.
    #[error("failed to accept connection")]
    Accept(#[source] io::Error),

    /// Reading from a connection or the SSDP socket failed.
    #[error("failed to read from socket")]
    Read(#[source] io::Error),

    /// Writing a response failed.
    #[error("failed to write response")]
    Write(#[source] io::Error),

    /// The peer stopped reading and its send buffer filled up; the
    /// connection was dropped instead of waiting on it.
    #[error("peer on {0} is not reading responses, connection dropped")]
    StalledPeer(Handle),

    /// A readiness event named a connection this switch does not own.
    #[error("no connection registered under handle {0}")]
    UnknownConnection(Handle),

    /// Watch-set bookkeeping went wrong.
    #[error("multiplexer error")]
    Multiplexer(#[from] MultiplexerError),
}

impl NetError {
    /// Whether the error only means "nothing to do right now".
    #[must_use]
    pub fn is_would_block(&self) -> bool {
        match self {
            Self::Accept(err) | Self::Read(err) => err.kind() == io::ErrorKind::WouldBlock,
            _ => false,
        }
    }
}
