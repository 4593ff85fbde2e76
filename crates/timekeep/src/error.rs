// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Error types for the time-keeping subsystem.
//!
//! Network and protocol failures are reported as [`NtpError`], text parsing
//! failures as [`ParseError`], and the facade wraps both in [`TimeError`].
//! `NtpError` converts into `io::Error` so callers that only deal in
//! `io::Result` can still recover the original variant by downcasting:
//!
//! ```
//! use std::io;
//! use timekeep::error::{ConnectionError, NtpError};
//!
//! let io_err: io::Error = NtpError::Connection(ConnectionError::NoInterface).into();
//! let inner = io_err.get_ref().and_then(|e| e.downcast_ref::<NtpError>());
//! assert!(matches!(inner, Some(NtpError::Connection(ConnectionError::NoInterface))));
//! ```
//!
//! Configuration rejections (timezone offset out of range, malformed DST
//! strings) are not errors: those setters return `bool` and keep the previous
//! state.

use std::fmt;
use std::io;

pub use timekeep_proto::error::ParseError as PacketParseError;
use timekeep_proto::protocol::KissOfDeath;

/// Errors that can occur while synchronizing against a network time source.
#[derive(Debug)]
pub enum NtpError {
    /// The server name could not be resolved.
    Dns(DnsError),
    /// The datagram exchange itself failed (no interface, send, receive, timeout).
    Connection(ConnectionError),
    /// A response arrived but could not be used (malformed or kiss-o'-death).
    Protocol(ProtocolError),
}

/// Name resolution failures.
#[derive(Debug)]
pub enum DnsError {
    /// No server was given and none is configured.
    NoServerConfigured,
    /// The resolver failed.
    Resolve {
        /// The host that failed to resolve.
        host: String,
        /// The resolver error.
        source: io::Error,
    },
    /// The host resolved to an empty address list.
    NoAddresses {
        /// The host that resolved to nothing.
        host: String,
    },
}

/// Transport failures.
#[derive(Debug)]
pub enum ConnectionError {
    /// No network interface is configured; no I/O was attempted.
    NoInterface,
    /// Binding the ephemeral local socket failed.
    Bind(io::Error),
    /// Sending the request failed.
    Send(io::Error),
    /// Receiving failed, including read timeouts.
    Receive(io::Error),
    /// Only datagrams from unexpected sources arrived before the attempt ceiling.
    RetriesExhausted {
        /// Number of datagrams received and discarded.
        attempts: usize,
    },
}

/// Response validation failures.
#[derive(Clone, Debug)]
pub enum ProtocolError {
    /// Response packet shorter than 48 bytes.
    ResponseTooShort {
        /// Number of bytes received.
        received: usize,
    },
    /// Stratum 0 response.
    KissOfDeath {
        /// The recognized kiss code, if any.
        code: Option<KissOfDeath>,
        /// The raw reference identifier octets.
        reference: [u8; 4],
    },
    /// Response has wrong mode (expected Server).
    UnexpectedMode,
    /// Origin timestamp does not match our request.
    OriginTimestampMismatch,
    /// Server transmit timestamp is zero (unsent).
    ZeroTransmitTimestamp,
    /// The packet bytes could not be decoded.
    Decode(PacketParseError),
}

/// Why a text parse failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A literal pattern character did not match the text.
    LiteralMismatch {
        /// The pattern character that was expected.
        expected: char,
    },
    /// A numeric directive found no digits.
    ExpectedNumber {
        /// The directive letter.
        directive: char,
    },
    /// A numeric directive read a value outside its valid range.
    OutOfRange {
        /// The directive letter.
        directive: char,
        /// The value that was read.
        value: i32,
    },
    /// A name directive (weekday, month, AM/PM, zone) matched no known name.
    UnknownName {
        /// The directive letter.
        directive: char,
    },
    /// Composite directives nested deeper than the matcher allows.
    RecursionLimit,
}

/// A text parse failure with the byte position in the input where it happened.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseError {
    /// Byte offset into the parsed text.
    pub position: usize,
    /// What went wrong.
    pub reason: ParseErrorKind,
}

/// Formatting into a caller-provided buffer failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FormatError {
    /// The formatted text does not fit; nothing was written.
    BufferTooSmall {
        /// Bytes the formatted text needs.
        needed: usize,
        /// Bytes the buffer offers.
        available: usize,
    },
}

/// Errors surfaced by the [`TimeService`](crate::TimeService) facade.
#[derive(Debug)]
pub enum TimeError {
    /// Synchronization failed; the RTC was left unchanged.
    Ntp(NtpError),
    /// Text did not match the pattern.
    Parse(ParseError),
    /// The parsed or seeded fields do not form a calendar date.
    InvalidDate,
    /// A time value cannot be represented as a calendar date.
    OutOfRange {
        /// The offending seconds value.
        seconds: i64,
    },
}

// ── Display implementations ─────────────────────────────────────────

impl fmt::Display for NtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NtpError::Dns(e) => write!(f, "NTP DNS error: {e}"),
            NtpError::Connection(e) => write!(f, "NTP connection error: {e}"),
            NtpError::Protocol(e) => write!(f, "NTP protocol error: {e}"),
        }
    }
}

impl fmt::Display for DnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DnsError::NoServerConfigured => write!(f, "no time server configured"),
            DnsError::Resolve { host, source } => write!(f, "cannot resolve {host}: {source}"),
            DnsError::NoAddresses { host } => {
                write!(f, "address resolved to no socket addresses: {host}")
            }
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::NoInterface => write!(f, "no network interface configured"),
            ConnectionError::Bind(e) => write!(f, "bind failed: {e}"),
            ConnectionError::Send(e) => write!(f, "send failed: {e}"),
            ConnectionError::Receive(e) => write!(f, "receive failed: {e}"),
            ConnectionError::RetriesExhausted { attempts } => {
                write!(f, "no response from the server after {attempts} datagrams")
            }
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::ResponseTooShort { received } => {
                write!(f, "NTP response too short ({received} bytes)")
            }
            ProtocolError::KissOfDeath {
                code: Some(code), ..
            } => write!(f, "server sent Kiss-o'-Death {code}"),
            ProtocolError::KissOfDeath {
                code: None,
                reference,
            } => write!(
                f,
                "server sent Kiss-o'-Death (stratum 0, reference {:?})",
                String::from_utf8_lossy(reference)
            ),
            ProtocolError::UnexpectedMode => {
                write!(f, "unexpected response mode (expected Server)")
            }
            ProtocolError::OriginTimestampMismatch => {
                write!(
                    f,
                    "origin timestamp mismatch: response does not match our request"
                )
            }
            ProtocolError::ZeroTransmitTimestamp => {
                write!(f, "server transmit timestamp is zero")
            }
            ProtocolError::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::LiteralMismatch { expected } => {
                write!(f, "expected {expected:?}")
            }
            ParseErrorKind::ExpectedNumber { directive } => {
                write!(f, "%{directive} expects digits")
            }
            ParseErrorKind::OutOfRange { directive, value } => {
                write!(f, "%{directive} value {value} out of range")
            }
            ParseErrorKind::UnknownName { directive } => {
                write!(f, "%{directive} matched no known name")
            }
            ParseErrorKind::RecursionLimit => write!(f, "composite directives nested too deeply"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at byte {}: {}", self.position, self.reason)
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::BufferTooSmall { needed, available } => write!(
                f,
                "formatted time needs {needed} bytes, buffer holds {available}"
            ),
        }
    }
}

impl fmt::Display for TimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeError::Ntp(e) => write!(f, "{e}"),
            TimeError::Parse(e) => write!(f, "{e}"),
            TimeError::InvalidDate => write!(f, "fields do not form a calendar date"),
            TimeError::OutOfRange { seconds } => {
                write!(f, "time value {seconds} is outside the calendar range")
            }
        }
    }
}

// ── Error trait implementations ─────────────────────────────────────

impl std::error::Error for NtpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NtpError::Dns(e) => Some(e),
            NtpError::Connection(e) => Some(e),
            NtpError::Protocol(e) => Some(e),
        }
    }
}

impl std::error::Error for DnsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DnsError::Resolve { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectionError::Bind(e) | ConnectionError::Send(e) | ConnectionError::Receive(e) => {
                Some(e)
            }
            _ => None,
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ParseError {}
impl std::error::Error for FormatError {}

impl std::error::Error for TimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimeError::Ntp(e) => Some(e),
            TimeError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

// ── From conversions ────────────────────────────────────────────────

impl From<NtpError> for io::Error {
    fn from(err: NtpError) -> io::Error {
        let kind = match &err {
            NtpError::Dns(_) => io::ErrorKind::NotFound,
            NtpError::Connection(ConnectionError::NoInterface) => io::ErrorKind::NotConnected,
            NtpError::Connection(ConnectionError::RetriesExhausted { .. }) => {
                io::ErrorKind::TimedOut
            }
            NtpError::Connection(
                ConnectionError::Bind(e) | ConnectionError::Send(e) | ConnectionError::Receive(e),
            ) => e.kind(),
            NtpError::Protocol(ProtocolError::KissOfDeath { .. }) => {
                io::ErrorKind::ConnectionRefused
            }
            NtpError::Protocol(_) => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, err)
    }
}

impl From<DnsError> for NtpError {
    fn from(err: DnsError) -> NtpError {
        NtpError::Dns(err)
    }
}

impl From<ConnectionError> for NtpError {
    fn from(err: ConnectionError) -> NtpError {
        NtpError::Connection(err)
    }
}

impl From<ProtocolError> for NtpError {
    fn from(err: ProtocolError) -> NtpError {
        NtpError::Protocol(err)
    }
}

impl From<NtpError> for TimeError {
    fn from(err: NtpError) -> TimeError {
        TimeError::Ntp(err)
    }
}

impl From<ParseError> for TimeError {
    fn from(err: ParseError) -> TimeError {
        TimeError::Parse(err)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let e = ProtocolError::ResponseTooShort { received: 10 };
        assert_eq!(e.to_string(), "NTP response too short (10 bytes)");
    }

    #[test]
    fn test_kiss_of_death_display() {
        let known = ProtocolError::KissOfDeath {
            code: Some(KissOfDeath::Rate),
            reference: *b"RATE",
        };
        assert_eq!(known.to_string(), "server sent Kiss-o'-Death RATE");
        let unknown = ProtocolError::KissOfDeath {
            code: None,
            reference: *b"ABCD",
        };
        assert!(unknown.to_string().contains("ABCD"));
    }

    #[test]
    fn test_parse_error_display() {
        let e = ParseError {
            position: 3,
            reason: ParseErrorKind::OutOfRange {
                directive: 'm',
                value: 13,
            },
        };
        assert_eq!(e.to_string(), "parse error at byte 3: %m value 13 out of range");
    }

    #[test]
    fn test_ntp_error_to_io_error_kind() {
        let cases: Vec<(NtpError, io::ErrorKind)> = vec![
            (
                NtpError::Dns(DnsError::NoAddresses {
                    host: "example.invalid".into(),
                }),
                io::ErrorKind::NotFound,
            ),
            (
                NtpError::Connection(ConnectionError::NoInterface),
                io::ErrorKind::NotConnected,
            ),
            (
                NtpError::Connection(ConnectionError::Receive(io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "timeout",
                ))),
                io::ErrorKind::WouldBlock,
            ),
            (
                NtpError::Connection(ConnectionError::RetriesExhausted { attempts: 20 }),
                io::ErrorKind::TimedOut,
            ),
            (
                NtpError::Protocol(ProtocolError::UnexpectedMode),
                io::ErrorKind::InvalidData,
            ),
            (
                NtpError::Protocol(ProtocolError::KissOfDeath {
                    code: Some(KissOfDeath::Deny),
                    reference: *b"DENY",
                }),
                io::ErrorKind::ConnectionRefused,
            ),
        ];
        for (ntp_err, expected_kind) in cases {
            let io_err: io::Error = ntp_err.into();
            assert_eq!(io_err.kind(), expected_kind);
        }
    }

    #[test]
    fn test_ntp_error_downcast_roundtrip() {
        let err = NtpError::Protocol(ProtocolError::ResponseTooShort { received: 10 });
        let io_err: io::Error = err.into();
        let inner = io_err
            .get_ref()
            .unwrap()
            .downcast_ref::<NtpError>()
            .unwrap();
        assert!(matches!(
            inner,
            NtpError::Protocol(ProtocolError::ResponseTooShort { received: 10 })
        ));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;
        let err = NtpError::Connection(ConnectionError::Send(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "broken",
        )));
        let conn = err.source().unwrap();
        assert_eq!(conn.source().unwrap().to_string(), "broken");
    }
}
