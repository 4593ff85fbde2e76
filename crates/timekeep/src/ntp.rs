// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! One-shot SNTP query.
//!
//! [`NtpClient::query`] sends one client-mode request and waits for one usable
//! reply. Datagrams from addresses the server name did not resolve to are
//! discarded; anything else either yields an [`NtpResult`] or an error. There is
//! no retransmission and no polling loop, which keeps the worst-case blocking
//! time at `timeout * max_attempts`.
//!
//! The network sits behind [`NetworkInterface`] so the exchange can run over
//! `std::net` ([`StdNetwork`]) or a scripted transport in tests.

use log::{debug, warn};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::ops::Deref;
use std::time::Duration;

use crate::error::{ConnectionError, DnsError, NtpError, ProtocolError};
use crate::protocol::{self, ConstPackedSizeBytes, LeapIndicator, Mode, Packet, Stratum};
use crate::rtc::UtcSource;
use crate::unix_time;

/// The well-known NTP port.
pub const DEFAULT_PORT: u16 = protocol::PORT;

/// Per-receive timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Datagrams read before giving up on hearing from the server.
pub const MAX_RECEIVE_ATTEMPTS: usize = 20;

/// Room for a header plus extension fields; only the first 48 bytes are read.
const RECV_BUFFER_LEN: usize = 1024;

/// A bound datagram socket.
pub trait DatagramSocket {
    /// Bound how long [`recv_from`](Self::recv_from) blocks.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Send one datagram.
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    /// Receive one datagram.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

impl DatagramSocket for UdpSocket {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        UdpSocket::set_read_timeout(self, timeout)
    }

    fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }
}

/// Name resolution and socket creation.
pub trait NetworkInterface {
    /// The socket type [`bind`](Self::bind) hands out.
    type Socket: DatagramSocket;

    /// Resolve `host` to socket addresses on `port`.
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;

    /// Bind an ephemeral local socket.
    fn bind(&self, local: SocketAddr) -> io::Result<Self::Socket>;
}

/// The host network stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdNetwork;

impl NetworkInterface for StdNetwork {
    type Socket = UdpSocket;

    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        Ok((host, port).to_socket_addrs()?.collect())
    }

    fn bind(&self, local: SocketAddr) -> io::Result<UdpSocket> {
        UdpSocket::bind(local)
    }
}

/// Select the appropriate bind address based on the target address family.
pub fn bind_addr_for(target: &SocketAddr) -> SocketAddr {
    match target {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}

/// A validated server response with the derived offset.
///
/// Derefs to the response [`Packet`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NtpResult {
    /// The server's response.
    pub packet: Packet,
    /// Local UTC seconds when the response arrived (T4).
    pub destination_seconds: i64,
    /// `((T2 - T1) + (T3 - T4)) / 2`: positive when the local clock is behind the server.
    pub offset_seconds: i64,
    /// `(T4 - T1) - (T3 - T2)`.
    pub delay_seconds: i64,
}

impl NtpResult {
    /// The server's transmit time in Unix seconds.
    pub fn server_seconds(&self) -> i64 {
        unix_time::timestamp_to_unix(self.packet.transmit_timestamp, self.destination_seconds)
    }
}

impl Deref for NtpResult {
    type Target = Packet;
    fn deref(&self) -> &Packet {
        &self.packet
    }
}

/// Check a received datagram against the request it answers and derive the clock offset.
///
/// `destination_unix` is the local time the datagram arrived.
pub fn validate_response(
    buf: &[u8],
    request: &Packet,
    destination_unix: i64,
) -> Result<NtpResult, ProtocolError> {
    if buf.len() < Packet::PACKED_SIZE_BYTES {
        return Err(ProtocolError::ResponseTooShort {
            received: buf.len(),
        });
    }
    let response = Packet::decode(buf).map_err(ProtocolError::Decode)?;

    if response.is_kiss_of_death() {
        return Err(ProtocolError::KissOfDeath {
            code: response.kiss_code(),
            reference: response.reference_bytes(),
        });
    }
    if response.mode != Mode::Server {
        return Err(ProtocolError::UnexpectedMode);
    }
    if response.origin_timestamp != request.transmit_timestamp {
        return Err(ProtocolError::OriginTimestampMismatch);
    }
    if response.transmit_timestamp.is_zero() {
        return Err(ProtocolError::ZeroTransmitTimestamp);
    }
    if response.leap_indicator == LeapIndicator::Unknown
        || response.stratum >= Stratum::UNSYNCHRONIZED
    {
        warn!(
            "server at stratum {} reports an unsynchronized clock",
            response.stratum.0
        );
    }

    let t1 = unix_time::resolve_ntp_seconds(request.transmit_timestamp.seconds, destination_unix);
    let t2 = unix_time::resolve_ntp_seconds(response.receive_timestamp.seconds, destination_unix);
    let t3 = unix_time::resolve_ntp_seconds(response.transmit_timestamp.seconds, destination_unix);
    let t4 = destination_unix + unix_time::EPOCH_DELTA;

    Ok(NtpResult {
        packet: response,
        destination_seconds: destination_unix,
        offset_seconds: unix_time::offset_seconds(t1, t2, t3, t4),
        delay_seconds: unix_time::delay_seconds(t1, t2, t3, t4),
    })
}

/// A one-shot SNTP client.
#[derive(Clone, Debug)]
pub struct NtpClient<N> {
    network: N,
    max_attempts: usize,
}

impl<N: NetworkInterface> NtpClient<N> {
    /// A client over `network` that reads at most [`MAX_RECEIVE_ATTEMPTS`] datagrams per query.
    pub fn new(network: N) -> Self {
        NtpClient {
            network,
            max_attempts: MAX_RECEIVE_ATTEMPTS,
        }
    }

    /// Change the receive ceiling.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// The receive ceiling.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// The network this client talks through.
    pub fn network(&self) -> &N {
        &self.network
    }

    /// Query `host:port`, stamping the request and the reply with `clock`.
    ///
    /// Each receive blocks for at most `timeout`; a receive error or timeout ends the query.
    pub fn query<C>(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
        clock: &C,
    ) -> Result<NtpResult, NtpError>
    where
        C: UtcSource + ?Sized,
    {
        let resolved = self
            .network
            .resolve(host, port)
            .map_err(|source| DnsError::Resolve {
                host: host.to_owned(),
                source,
            })?;
        let target = *resolved.first().ok_or_else(|| DnsError::NoAddresses {
            host: host.to_owned(),
        })?;
        debug!("resolved {} to {}", host, target);

        let request = Packet::client_request(unix_time::to_timestamp(clock.now_utc()));
        let send_buf = request.encode().map_err(ConnectionError::Send)?;

        let sock = self
            .network
            .bind(bind_addr_for(&target))
            .map_err(ConnectionError::Bind)?;
        // A zero timeout means "block forever" to std; keep the bound.
        let timeout = timeout.max(Duration::from_millis(1));
        sock.set_read_timeout(Some(timeout))
            .map_err(ConnectionError::Bind)?;

        let sent = sock
            .send_to(&send_buf, target)
            .map_err(ConnectionError::Send)?;
        debug!("sent: {} bytes to {}", sent, target);

        let mut recv_buf = [0u8; RECV_BUFFER_LEN];
        for attempt in 1..=self.max_attempts {
            let (recv_len, src_addr) = sock
                .recv_from(&mut recv_buf)
                .map_err(ConnectionError::Receive)?;
            let destination = clock.now_utc();
            debug!(
                "recv: {} bytes from {} (attempt {}/{})",
                recv_len, src_addr, attempt, self.max_attempts
            );

            // Port may differ, the IP may not.
            if !resolved.iter().any(|a| a.ip() == src_addr.ip()) {
                debug!("discarding datagram from unexpected source {}", src_addr);
                continue;
            }

            let result = validate_response(&recv_buf[..recv_len], &request, destination)?;
            debug!(
                "offset {} s, delay {} s, stratum {}",
                result.offset_seconds, result.delay_seconds, result.stratum.0
            );
            return Ok(result);
        }
        warn!("no datagram from {} after {} attempts", host, self.max_attempts);
        Err(ConnectionError::RetriesExhausted {
            attempts: self.max_attempts,
        }
        .into())
    }
}
