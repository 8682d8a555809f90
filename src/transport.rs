use log::{trace, warn};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Failure of a single request/response exchange
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no response from {server} within {timeout:?}")]
    Timeout { server: SocketAddr, timeout: Duration },
    #[error("socket error talking to {server}: {source}")]
    Io {
        server: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Sends one query datagram and waits for the matching response
///
/// Implementations must not retry; the resolver moves on to the next server
/// when an exchange fails.
pub trait Transport {
    fn exchange(&mut self, server: SocketAddr, query: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn exchange(&mut self, server: SocketAddr, query: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).exchange(server, query)
    }
}

/// Blocking UDP transport, one fresh socket per exchange
#[derive(Debug, Clone)]
pub struct UdpTransport {
    timeout: Duration,
    recv_buffer_size: usize,
}

impl UdpTransport {
    pub fn new(timeout: Duration, recv_buffer_size: usize) -> UdpTransport {
        UdpTransport {
            timeout,
            recv_buffer_size,
        }
    }

    fn bind_for(server: &SocketAddr) -> io::Result<UdpSocket> {
        let (domain, any) = match *server {
            SocketAddr::V4(..) => (
                Domain::IPV4,
                SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
            ),
            SocketAddr::V6(..) => (
                Domain::IPV6,
                SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
            ),
        };
        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        let addr: SockAddr = any.into();
        socket.bind(&addr)?;
        Ok(socket.into())
    }

    fn try_exchange(&self, server: SocketAddr, query: &[u8]) -> io::Result<Option<Vec<u8>>> {
        let socket = Self::bind_for(&server)?;
        socket.set_write_timeout(Some(self.timeout))?;

        let sent = socket.send_to(query, server)?;
        if sent != query.len() {
            warn!("sent {} of {} bytes to {}", sent, query.len(), server);
        }

        let deadline = Instant::now() + self.timeout;
        let mut buf = vec![0u8; self.recv_buffer_size];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            socket.set_read_timeout(Some(remaining))?;

            match socket.recv_from(&mut buf) {
                Ok((len, from)) if from == server => {
                    trace!("received {} bytes from {}", len, from);
                    buf.truncate(len);
                    return Ok(Some(buf));
                }
                Ok((len, from)) => {
                    warn!("ignoring {} bytes from unexpected peer {}", len, from);
                }
                Err(ref err)
                    if err.kind() == io::ErrorKind::WouldBlock
                        || err.kind() == io::ErrorKind::TimedOut =>
                {
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Transport for UdpTransport {
    fn exchange(&mut self, server: SocketAddr, query: &[u8]) -> Result<Vec<u8>, TransportError> {
        trace!("sending {} bytes to {}", query.len(), server);
        match self.try_exchange(server, query) {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(TransportError::Timeout {
                server,
                timeout: self.timeout,
            }),
            Err(source) => Err(TransportError::Io { server, source }),
        }
    }
}
