// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! SNTP packet types and epoch arithmetic.
//!
//! This crate holds the wire-level half of the `timekeep` subsystem: the fixed
//! 48-byte NTP packet (RFC 4330 client/server subset), its network-order codec,
//! and the conversions between the Unix epoch used by the RTC and the 1900 NTP
//! epoch used on the wire.

#![warn(missing_docs)]

/// Packet decoding errors.
pub mod error;

/// NTP packet types and constants.
pub mod protocol;

/// Unix/NTP epoch conversion and four-timestamp offset arithmetic.
pub mod unix_time;
