// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Packet decoding errors.

use std::fmt;
use std::io;

/// A datagram could not be decoded as a packet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// Fewer bytes than the fixed header needs.
    BufferTooShort {
        /// Bytes the header needs.
        needed: usize,
        /// Bytes the datagram carried.
        available: usize,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::BufferTooShort { needed, available } => {
                write!(f, "packet truncated: {available} of {needed} bytes")
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for io::Error {
    fn from(err: ParseError) -> io::Error {
        io::Error::new(io::ErrorKind::UnexpectedEof, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = ParseError::BufferTooShort {
            needed: 48,
            available: 10,
        };
        assert_eq!(err.to_string(), "packet truncated: 10 of 48 bytes");
    }

    #[test]
    fn io_error_keeps_inner() {
        let err = ParseError::BufferTooShort {
            needed: 48,
            available: 0,
        };
        let io_err: io::Error = err.clone().into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
        let inner = io_err.get_ref().and_then(|e| e.downcast_ref::<ParseError>());
        assert_eq!(inner, Some(&err));
    }
}
