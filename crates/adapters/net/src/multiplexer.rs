//! Readiness multiplexer: one watch set, one wait, many owners.
//!
//! Every socket the emulator listens on is registered here under a
//! [`Handle`] together with a small owner tag. [`Multiplexer::wait`] blocks
//! until at least one watched socket is readable (or the timeout elapses)
//! and reports which handles are ready; the caller dispatches on the owner.
//!
//! Readiness is level-triggered: a socket keeps being reported until a read
//! on it observes `WouldBlock`.

use std::collections::BTreeMap;
use std::future::poll_fn;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, UdpSocket};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::unix::AsyncFd;

/// Opaque identifier of a watched socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u64);

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Bookkeeping errors surfaced by the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MultiplexerError {
    #[error("handle {0} is already registered")]
    DuplicateHandle(Handle),

    #[error("handle {0} is not registered")]
    UnknownHandle(Handle),
}

/// A non-blocking socket the multiplexer can watch.
#[derive(Debug)]
pub enum Source {
    Listener(AsyncFd<TcpListener>),
    Stream(AsyncFd<TcpStream>),
    Datagram(AsyncFd<UdpSocket>),
}

impl Source {
    /// Watch a listening TCP socket.
    ///
    /// # Errors
    ///
    /// Fails when the socket cannot be made non-blocking or registered with
    /// the reactor.
    pub fn listener(listener: TcpListener) -> io::Result<Self> {
        listener.set_nonblocking(true)?;
        Ok(Self::Listener(AsyncFd::new(listener)?))
    }

    /// Watch an accepted TCP connection.
    ///
    /// # Errors
    ///
    /// Fails when the socket cannot be made non-blocking or registered with
    /// the reactor.
    pub fn stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        Ok(Self::Stream(AsyncFd::new(stream)?))
    }

    /// Watch a UDP socket.
    ///
    /// # Errors
    ///
    /// Fails when the socket cannot be made non-blocking or registered with
    /// the reactor.
    pub fn datagram(socket: UdpSocket) -> io::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self::Datagram(AsyncFd::new(socket)?))
    }

    /// Local address the socket is bound to.
    ///
    /// # Errors
    ///
    /// Propagates the OS error.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            Self::Listener(fd) => fd.get_ref().local_addr(),
            Self::Stream(fd) => fd.get_ref().local_addr(),
            Self::Datagram(fd) => fd.get_ref().local_addr(),
        }
    }

    /// Accept one pending connection.
    ///
    /// Readiness stays set afterwards, so the listener is reported once more
    /// and that accept sees `WouldBlock`.
    ///
    /// # Errors
    ///
    /// `WouldBlock` when nothing is pending (readiness is cleared), any other
    /// OS error as-is, `Unsupported` on a non-listening source.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let Self::Listener(fd) = self else {
            return Err(unsupported("accept"));
        };
        let mut guard = fd.readable().await?;
        match guard.try_io(|inner| inner.get_ref().accept()) {
            Ok(result) => result,
            Err(_would_block) => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    /// Read at most `buf.len()` bytes from a connection. `Ok(0)` means the
    /// peer closed its side.
    ///
    /// A short read drains the socket, so readiness is cleared with it.
    ///
    /// # Errors
    ///
    /// `WouldBlock` when nothing is buffered (readiness is cleared), any other
    /// OS error as-is, `Unsupported` on a non-stream source.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let Self::Stream(fd) = self else {
            return Err(unsupported("read"));
        };
        let capacity = buf.len();
        let mut guard = fd.readable().await?;
        match guard.try_io(|inner| {
            let mut stream = inner.get_ref();
            stream.read(buf)
        }) {
            Ok(Ok(read)) => {
                if read > 0 && read < capacity {
                    guard.clear_ready();
                }
                Ok(read)
            }
            Ok(Err(err)) => Err(err),
            Err(_would_block) => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    /// Receive one datagram, truncated to `buf.len()` bytes.
    ///
    /// # Errors
    ///
    /// `WouldBlock` when nothing is queued (readiness is cleared), any other
    /// OS error as-is, `Unsupported` on a non-datagram source.
    pub async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let Self::Datagram(fd) = self else {
            return Err(unsupported("recv_from"));
        };
        let mut guard = fd.readable().await?;
        match guard.try_io(|inner| inner.get_ref().recv_from(buf)) {
            Ok(result) => result,
            Err(_would_block) => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    /// Write the whole of `data` to a connection without waiting.
    ///
    /// The send buffer has to take everything at once. A peer that stops
    /// reading is reported instead of waited for.
    ///
    /// # Errors
    ///
    /// `WouldBlock` when the send buffer fills before `data` is written (a
    /// prefix may already be gone), `WriteZero` if the peer stops accepting
    /// bytes, any other OS error as-is, `Unsupported` on a non-stream source.
    pub fn try_write_all(&self, data: &[u8]) -> io::Result<()> {
        let Self::Stream(fd) = self else {
            return Err(unsupported("write"));
        };
        let mut stream = fd.get_ref();
        let mut written = 0;
        while written < data.len() {
            match stream.write(&data[written..]) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => written += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Whether the socket currently has input pending. Registers the waker
    /// in `cx` otherwise.
    fn poll_readable(&self, cx: &mut Context<'_>) -> bool {
        // Dropping the guard without clearing it keeps the socket ready.
        match self {
            Self::Listener(fd) => fd.poll_read_ready(cx).is_ready(),
            Self::Stream(fd) => fd.poll_read_ready(cx).is_ready(),
            Self::Datagram(fd) => fd.poll_read_ready(cx).is_ready(),
        }
    }
}

fn unsupported(operation: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{operation} is not supported on this socket kind"),
    )
}

#[derive(Debug)]
struct Watch<O> {
    source: Arc<Source>,
    owner: O,
}

/// Watch set mapping handles to their socket and owner tag.
#[derive(Debug)]
pub struct Multiplexer<O> {
    watched: BTreeMap<Handle, Watch<O>>,
    next_handle: u64,
}

impl<O> Default for Multiplexer<O> {
    fn default() -> Self {
        Self {
            watched: BTreeMap::new(),
            next_handle: 0,
        }
    }
}

impl<O: Copy> Multiplexer<O> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh handle. Handles are never reused.
    pub fn allocate(&mut self) -> Handle {
        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Add `source` to the watch set under `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplexerError::DuplicateHandle`] if `handle` is already watched.
    pub fn register(
        &mut self,
        handle: Handle,
        source: Arc<Source>,
        owner: O,
    ) -> Result<(), MultiplexerError> {
        if self.watched.contains_key(&handle) {
            return Err(MultiplexerError::DuplicateHandle(handle));
        }
        self.watched.insert(handle, Watch { source, owner });
        Ok(())
    }

    /// Remove `handle` from the watch set, returning its source.
    ///
    /// # Errors
    ///
    /// Returns [`MultiplexerError::UnknownHandle`] if `handle` is not watched,
    /// which always points at a bookkeeping bug in the caller.
    pub fn unregister(&mut self, handle: Handle) -> Result<Arc<Source>, MultiplexerError> {
        self.watched
            .remove(&handle)
            .map(|watch| watch.source)
            .ok_or(MultiplexerError::UnknownHandle(handle))
    }

    /// Owner tag registered for `handle`.
    #[must_use]
    pub fn owner(&self, handle: Handle) -> Option<O> {
        self.watched.get(&handle).map(|watch| watch.owner)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.watched.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watched.is_empty()
    }

    /// Wait until at least one watched socket is readable, or `timeout`.
    ///
    /// Returns the ready handles with their owners, in handle order; an empty
    /// list means the timeout elapsed. With nothing watched this sleeps for
    /// `timeout` rather than returning immediately, so callers looping on it
    /// do not spin.
    pub async fn wait(&self, timeout: Duration) -> Vec<(Handle, O)> {
        if self.watched.is_empty() {
            tokio::time::sleep(timeout).await;
            return Vec::new();
        }
        let ready = poll_fn(|cx| {
            let ready: Vec<(Handle, O)> = self
                .watched
                .iter()
                .filter(|(_, watch)| watch.source.poll_readable(cx))
                .map(|(handle, watch)| (*handle, watch.owner))
                .collect();
            if ready.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(ready)
            }
        });
        tokio::time::timeout(timeout, ready)
            .await
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn udp() -> (Arc<Source>, SocketAddr) {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let addr = socket.local_addr().unwrap();
        (Arc::new(Source::datagram(socket).unwrap()), addr)
    }

    #[tokio::test]
    async fn should_reject_duplicate_handle() {
        let mut mux = Multiplexer::new();
        let (source, _) = udp();
        let handle = mux.allocate();
        mux.register(handle, Arc::clone(&source), 'a').unwrap();
        assert_eq!(
            mux.register(handle, source, 'b'),
            Err(MultiplexerError::DuplicateHandle(handle))
        );
        assert_eq!(mux.owner(handle), Some('a'));
    }

    #[tokio::test]
    async fn should_fail_loudly_on_unknown_unregister() {
        let mut mux = Multiplexer::<char>::new();
        let (source, _) = udp();
        let handle = mux.allocate();
        mux.register(handle, source, 'a').unwrap();

        assert!(mux.unregister(handle).is_ok());
        assert!(matches!(
            mux.unregister(handle),
            Err(MultiplexerError::UnknownHandle(h)) if h == handle
        ));
        assert!(mux.is_empty());
    }

    #[tokio::test]
    async fn should_allocate_distinct_handles() {
        let mut mux = Multiplexer::<()>::new();
        let a = mux.allocate();
        let b = mux.allocate();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn should_return_empty_after_timeout_when_nothing_is_ready() {
        let mut mux = Multiplexer::new();
        let (source, _) = udp();
        let handle = mux.allocate();
        mux.register(handle, source, ()).unwrap();
        assert!(mux.wait(TIMEOUT).await.is_empty());
    }

    #[tokio::test]
    async fn should_not_block_forever_on_empty_watch_set() {
        let mux = Multiplexer::<()>::new();
        assert!(mux.wait(TIMEOUT).await.is_empty());
    }

    #[tokio::test]
    async fn should_report_readable_socket_until_drained() {
        let mut mux = Multiplexer::new();
        let (source, addr) = udp();
        let handle = mux.allocate();
        mux.register(handle, Arc::clone(&source), 7u8).unwrap();

        let sender = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        sender.send_to(b"ping", addr).unwrap();

        assert_eq!(mux.wait(TIMEOUT).await, vec![(handle, 7)]);
        // Level-triggered: still ready until the datagram is consumed.
        assert_eq!(mux.wait(TIMEOUT).await, vec![(handle, 7)]);

        let mut buf = [0u8; 16];
        let (n, from) = source.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"ping");
        assert_eq!(from, sender.local_addr().unwrap());

        let drained = source.recv_from(&mut buf).await;
        assert_eq!(
            drained.map_err(|e| e.kind()).err(),
            Some(io::ErrorKind::WouldBlock)
        );
        assert!(mux.wait(TIMEOUT).await.is_empty());
    }

    fn connected_pair() -> (Arc<Source>, TcpStream) {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        (Arc::new(Source::stream(accepted).unwrap()), client)
    }

    #[tokio::test]
    async fn should_report_full_send_buffer_instead_of_waiting() {
        let (source, _idle_peer) = connected_pair();
        let chunk = vec![b'x'; 64 * 1024];

        let mut outcome = Ok(());
        for _ in 0..10_000 {
            outcome = source.try_write_all(&chunk);
            if outcome.is_err() {
                break;
            }
        }
        assert_eq!(
            outcome.map_err(|e| e.kind()).err(),
            Some(io::ErrorKind::WouldBlock)
        );
    }

    #[tokio::test]
    async fn should_stop_reporting_stream_after_short_read() {
        let mut mux = Multiplexer::new();
        let (source, mut peer) = connected_pair();
        let handle = mux.allocate();
        mux.register(handle, Arc::clone(&source), ()).unwrap();

        peer.write_all(b"hello").unwrap();
        assert_eq!(mux.wait(TIMEOUT).await, vec![(handle, ())]);

        let mut buf = [0u8; 64];
        assert_eq!(source.read(&mut buf).await.unwrap(), 5);
        assert!(mux.wait(TIMEOUT).await.is_empty());
    }

    #[tokio::test]
    async fn should_refuse_stream_operations_on_datagram_socket() {
        let (source, _) = udp();
        let mut buf = [0u8; 4];
        let err = source.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
