// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Shared helpers for integration tests.

// Integration test helpers are `pub` so each `tests/*.rs` file can import them
// via `mod common`, but not every file uses every helper.
#![allow(unreachable_pub, dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use timekeep::ntp::{DatagramSocket, NetworkInterface};
use timekeep::protocol::{Mode, Packet, Stratum};
use timekeep::unix_time;

/// Address the fake resolver hands out for [`SERVER_HOST`].
pub const SERVER_ADDR: &str = "192.0.2.123:123";

/// Host name the fake resolver knows.
pub const SERVER_HOST: &str = "ntp.test";

/// Computes the reply datagram from the request it answers.
pub type Reply = Box<dyn Fn(&Packet) -> io::Result<(Vec<u8>, SocketAddr)>>;

#[derive(Default)]
struct State {
    sent: Vec<Vec<u8>>,
    binds: usize,
    replies: VecDeque<Reply>,
}

/// An in-memory network with one scripted NTP server.
///
/// Every `recv_from` pops the next scripted reply; an empty script behaves like a read
/// timeout.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    state: Rc<RefCell<State>>,
}

impl FakeNetwork {
    pub fn new() -> Self {
        FakeNetwork::default()
    }

    /// Queue a reply computed from the request.
    pub fn reply(
        self,
        reply: impl Fn(&Packet) -> io::Result<(Vec<u8>, SocketAddr)> + 'static,
    ) -> Self {
        self.state.borrow_mut().replies.push_back(Box::new(reply));
        self
    }

    /// Queue a well-formed server response whose clock reads `server_unix`.
    pub fn server_time(self, server_unix: i64) -> Self {
        self.reply(move |req| from_server(server_response(req, server_unix)))
    }

    /// Number of datagrams sent so far.
    pub fn sent(&self) -> usize {
        self.state.borrow().sent.len()
    }

    /// Number of sockets bound so far.
    pub fn binds(&self) -> usize {
        self.state.borrow().binds
    }
}

/// A valid server-mode answer to `request`, with receive and transmit at `server_unix`.
pub fn server_response(request: &Packet, server_unix: i64) -> Packet {
    Packet {
        mode: Mode::Server,
        stratum: Stratum(2),
        origin_timestamp: request.transmit_timestamp,
        receive_timestamp: unix_time::to_timestamp(server_unix),
        transmit_timestamp: unix_time::to_timestamp(server_unix),
        ..Packet::default()
    }
}

/// Encode `packet` as coming from [`SERVER_ADDR`].
pub fn from_server(packet: Packet) -> io::Result<(Vec<u8>, SocketAddr)> {
    Ok((packet.encode()?.to_vec(), server_addr()))
}

pub fn server_addr() -> SocketAddr {
    SERVER_ADDR.parse().expect("valid socket address")
}

pub struct FakeSocket {
    state: Rc<RefCell<State>>,
}

impl NetworkInterface for FakeNetwork {
    type Socket = FakeSocket;

    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        if host == SERVER_HOST {
            Ok(vec![SocketAddr::new(server_addr().ip(), port)])
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such host"))
        }
    }

    fn bind(&self, _local: SocketAddr) -> io::Result<FakeSocket> {
        self.state.borrow_mut().binds += 1;
        Ok(FakeSocket {
            state: self.state.clone(),
        })
    }
}

impl DatagramSocket for FakeSocket {
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }

    fn send_to(&self, buf: &[u8], _target: SocketAddr) -> io::Result<usize> {
        self.state.borrow_mut().sent.push(buf.to_vec());
        Ok(buf.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let mut state = self.state.borrow_mut();
        let Some(reply) = state.replies.pop_front() else {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "timed out"));
        };
        let last = state.sent.last().cloned().unwrap_or_default();
        let request = Packet::decode(&last)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let (bytes, from) = reply(&request)?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok((bytes.len(), from))
    }
}

/// Returns `true` if the I/O error indicates a network-level failure that
/// should cause the test to be **skipped** (not panicked).
pub fn is_network_skip_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::NotFound
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::AddrNotAvailable
            | io::ErrorKind::NotConnected
    ) || e.raw_os_error() == Some(101) // ENETUNREACH  (Network is unreachable)
      || e.raw_os_error() == Some(113) // EHOSTUNREACH (No route to host)
      || e.to_string().contains("Network is unreachable")
      || e.to_string().contains("No route to host")
}
