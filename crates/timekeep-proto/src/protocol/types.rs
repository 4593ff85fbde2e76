// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use super::{code_to_u32, ConstPackedSizeBytes};

/// A 64-bit wire timestamp: seconds since 1900-01-01 UTC in the high word, a binary
/// fraction of a second in the low word.
///
/// The seconds field wraps every 2^32 s; see [`crate::unix_time::resolve_ntp_seconds`] for
/// placing it in the right era.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TimestampFormat {
    /// Whole seconds, modulo 2^32.
    pub seconds: u32,
    /// Fraction of a second in units of 2^-32 s. The RTC has whole-second resolution, so
    /// requests always send 0 here.
    pub fraction: u32,
}

impl TimestampFormat {
    /// Both words zero, which the protocol reserves for "not set".
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.fraction == 0
    }
}

/// Leap second warning, bits 6-7 of the first header byte.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum LeapIndicator {
    /// No leap second pending.
    #[default]
    NoWarning = 0,
    /// The last minute of the month has 61 seconds.
    AddOne = 1,
    /// The last minute of the month has 59 seconds.
    SubOne = 2,
    /// The server's clock is not synchronized.
    Unknown = 3,
}

impl LeapIndicator {
    /// Decode the two low bits of `bits`. Every value is meaningful.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => LeapIndicator::NoWarning,
            1 => LeapIndicator::AddOne,
            2 => LeapIndicator::SubOne,
            _ => LeapIndicator::Unknown,
        }
    }
}

/// Protocol version, bits 3-5 of the first header byte.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Version(u8);

impl Version {
    /// SNTPv4, the version every request carries.
    pub const V4: Self = Version(4);

    /// Keep the three low bits of `bits`.
    pub const fn from_bits(bits: u8) -> Self {
        Version(bits & 0b111)
    }

    /// The version number, 0-7.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Version::V4
    }
}

/// Association mode, bits 0-2 of the first header byte.
///
/// A client only ever sends [`Mode::Client`] and only accepts [`Mode::Server`]; the other
/// values exist so any received byte decodes.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// 0, reserved.
    Reserved = 0,
    /// 1.
    SymmetricActive = 1,
    /// 2.
    SymmetricPassive = 2,
    /// 3, sent in requests.
    #[default]
    Client = 3,
    /// 4, expected in responses.
    Server = 4,
    /// 5.
    Broadcast = 5,
    /// 6, control messages.
    Control = 6,
    /// 7, private use.
    Private = 7,
}

impl Mode {
    /// Decode the three low bits of `bits`. Every value is meaningful.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Mode::Reserved,
            1 => Mode::SymmetricActive,
            2 => Mode::SymmetricPassive,
            3 => Mode::Client,
            4 => Mode::Server,
            5 => Mode::Broadcast,
            6 => Mode::Control,
            _ => Mode::Private,
        }
    }
}

/// Distance from a reference clock: 1 is a primary server, 2-15 count hops, 16 means
/// unsynchronized and 0 marks a kiss-o'-death.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Stratum(pub u8);

impl Stratum {
    /// Kiss-o'-death marker.
    pub const UNSPECIFIED: Self = Stratum(0);
    /// The server has lost its own source; this and higher values are not usable time.
    pub const UNSYNCHRONIZED: Self = Stratum(16);
}

/// Kiss codes a stratum 0 response may spell in its reference identifier.
///
/// `DENY` and `RSTR` mean the server refuses this client; `RATE` asks it to back off.
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KissOfDeath {
    /// Access denied.
    Deny = code_to_u32(b"DENY"),
    /// Access restricted by server policy.
    Rstr = code_to_u32(b"RSTR"),
    /// Polling too fast.
    Rate = code_to_u32(b"RATE"),
}

impl KissOfDeath {
    const ALL: [KissOfDeath; 3] = [KissOfDeath::Deny, KissOfDeath::Rstr, KissOfDeath::Rate];

    /// The kiss code spelled by a reference identifier, if it is one we act on.
    pub fn from_reference(reference_id: u32) -> Option<Self> {
        KissOfDeath::ALL
            .into_iter()
            .find(|code| *code as u32 == reference_id)
    }
}

impl fmt::Display for KissOfDeath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = (*self as u32).to_be_bytes();
        f.write_str(std::str::from_utf8(&bytes).map_err(|_| fmt::Error)?)
    }
}

/// The 48-byte SNTP header.
///
/// | bytes | field |
/// |-------|-------|
/// | 0 | LI, VN, mode |
/// | 1 | stratum |
/// | 2 | poll (log2 s) |
/// | 3 | precision (log2 s) |
/// | 4-7 | root delay |
/// | 8-11 | root dispersion |
/// | 12-15 | reference id |
/// | 16-23 | reference timestamp |
/// | 24-31 | origin timestamp |
/// | 32-39 | receive timestamp |
/// | 40-47 | transmit timestamp |
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Packet {
    /// Pending leap second, or an unsynchronized server.
    pub leap_indicator: LeapIndicator,
    /// Protocol version.
    pub version: Version,
    /// Client in requests, server in responses.
    pub mode: Mode,
    /// Server distance from its reference; 0 is a kiss-o'-death.
    pub stratum: Stratum,
    /// Poll interval exponent.
    pub poll: i8,
    /// Clock precision exponent.
    pub precision: i8,
    /// Round trip to the reference, signed 16.16 seconds.
    pub root_delay: i32,
    /// Dispersion to the reference, unsigned 16.16 seconds.
    pub root_dispersion: u32,
    /// Reference clock id, upstream address or kiss code.
    pub reference_id: u32,
    /// When the server clock was last set.
    pub reference_timestamp: TimestampFormat,
    /// Echo of the request's transmit timestamp (T1).
    pub origin_timestamp: TimestampFormat,
    /// Request arrival at the server (T2).
    pub receive_timestamp: TimestampFormat,
    /// Response departure from the server (T3), or request departure from the client.
    pub transmit_timestamp: TimestampFormat,
}

/// The three fields packed into header byte 0.
pub type PacketByte1 = (LeapIndicator, Version, Mode);

impl Packet {
    /// A version 4 client request carrying only `transmit_timestamp`.
    pub fn client_request(transmit_timestamp: TimestampFormat) -> Self {
        Packet {
            version: Version::V4,
            mode: Mode::Client,
            transmit_timestamp,
            ..Packet::default()
        }
    }

    /// Stratum 0, whatever the reference id says.
    pub fn is_kiss_of_death(&self) -> bool {
        self.stratum == Stratum::UNSPECIFIED
    }

    /// The recognized kiss code of a stratum 0 packet.
    pub fn kiss_code(&self) -> Option<KissOfDeath> {
        if self.is_kiss_of_death() {
            KissOfDeath::from_reference(self.reference_id)
        } else {
            None
        }
    }

    /// The reference id as four octets, e.g. an ASCII kiss code.
    pub fn reference_bytes(&self) -> [u8; 4] {
        self.reference_id.to_be_bytes()
    }
}

impl ConstPackedSizeBytes for TimestampFormat {
    const PACKED_SIZE_BYTES: usize = 8;
}

impl ConstPackedSizeBytes for Stratum {
    const PACKED_SIZE_BYTES: usize = 1;
}

impl ConstPackedSizeBytes for PacketByte1 {
    const PACKED_SIZE_BYTES: usize = 1;
}

// Byte 0, stratum, poll and precision, three 32-bit words, four timestamps.
impl ConstPackedSizeBytes for Packet {
    const PACKED_SIZE_BYTES: usize = PacketByte1::PACKED_SIZE_BYTES
        + Stratum::PACKED_SIZE_BYTES
        + 2
        + 3 * 4
        + 4 * TimestampFormat::PACKED_SIZE_BYTES;
}
