// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The SNTP header and its big-endian codec (RFC 4330).
//!
//! [`ReadBytes`] and [`WriteBytes`] ride on byteorder's extension traits, so any reader or
//! writer can move packets.

/// Well-known UDP port of a time server.
pub const PORT: u16 = 123;

/// Pack a four-character ASCII code into a big-endian `u32`.
pub const fn code_to_u32(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

mod io;
mod traits;
mod types;

pub use self::traits::*;
pub use self::types::*;
