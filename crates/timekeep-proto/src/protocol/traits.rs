// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io;

/// Write any wire value in big-endian order. Implemented for every `WriteBytesExt`.
pub trait WriteBytes {
    /// Append `value` to this writer.
    fn write_bytes<P: WriteToBytes>(&mut self, value: P) -> io::Result<()>;
}

/// Read any wire value in big-endian order. Implemented for every `ReadBytesExt`.
pub trait ReadBytes {
    /// Consume one `P` from this reader.
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P>;
}

/// Encoding half of a wire value.
pub trait WriteToBytes {
    /// Serialize `self` into `writer`.
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()>;
}

/// Decoding half of a wire value.
pub trait ReadFromBytes: Sized {
    /// Deserialize one value from `reader`.
    fn read_from_bytes<R: ReadBytesExt>(reader: R) -> io::Result<Self>;
}

/// Fixed encoded length.
pub trait ConstPackedSizeBytes {
    /// Bytes this value occupies on the wire.
    const PACKED_SIZE_BYTES: usize;
}
