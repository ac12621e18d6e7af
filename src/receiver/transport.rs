use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Weak;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::net::UdpSocket;
use tracing::trace;

use crate::Result;
use crate::TransportError;

/// Source of inbound datagrams consumed by the receive loop.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatagramTransport: Send + Sync + 'static {
    /// Waits for the next datagram and copies it into `buf`, returning its
    /// length. `WouldBlock` means no data is available yet.
    async fn recv_datagram(
        &self,
        buf: &mut [u8],
    ) -> io::Result<usize>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl DatagramTransport for UdpSocket {
    async fn recv_datagram(
        &self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        let (len, peer) = self.recv_from(buf).await?;
        trace!(%peer, len, "datagram received");
        Ok(len)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

/// Receive handle on a socket owned elsewhere.
///
/// Holds only a weak reference between receives, so dropping the owner's
/// `Arc` closes the socket even when the loop using this lease is stuck
/// outside a receive call.
#[derive(Debug, Clone)]
pub struct SocketLease {
    socket: Weak<UdpSocket>,
}

impl SocketLease {
    pub fn new(socket: &Arc<UdpSocket>) -> Self {
        Self {
            socket: Arc::downgrade(socket),
        }
    }

    /// Whether the owner still holds the socket
    pub fn is_live(&self) -> bool {
        self.socket.strong_count() > 0
    }

    fn upgrade(&self) -> io::Result<Arc<UdpSocket>> {
        self.socket
            .upgrade()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket released"))
    }
}

#[async_trait]
impl DatagramTransport for SocketLease {
    async fn recv_datagram(
        &self,
        buf: &mut [u8],
    ) -> io::Result<usize> {
        let socket = self.upgrade()?;
        socket.recv_datagram(buf).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.upgrade()?.local_addr()
    }
}

/// Binds a UDP socket on `endpoint` (`host:port`).
///
/// No retry: a failure here is reported to the caller as
/// [`TransportError::BindFailed`].
pub async fn bind_udp(endpoint: &str) -> Result<UdpSocket> {
    UdpSocket::bind(endpoint).await.map_err(|source| {
        TransportError::BindFailed {
            address: endpoint.to_string(),
            source,
        }
        .into()
    })
}
