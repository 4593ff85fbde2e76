// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::io;

use super::{
    ConstPackedSizeBytes, LeapIndicator, Mode, Packet, PacketByte1, ReadBytes, ReadFromBytes,
    Stratum, TimestampFormat, Version, WriteBytes, WriteToBytes,
};
use crate::error::ParseError;

// ── Blanket impls ───────────────────────────────────────────────────

impl<W: WriteBytesExt> WriteBytes for W {
    fn write_bytes<P: WriteToBytes>(&mut self, value: P) -> io::Result<()> {
        value.write_to_bytes(self)
    }
}

impl<R: ReadBytesExt> ReadBytes for R {
    fn read_bytes<P: ReadFromBytes>(&mut self) -> io::Result<P> {
        P::read_from_bytes(self)
    }
}

impl<P: WriteToBytes> WriteToBytes for &P {
    fn write_to_bytes<W: WriteBytesExt>(&self, writer: W) -> io::Result<()> {
        P::write_to_bytes(self, writer)
    }
}

// ── Field codecs ────────────────────────────────────────────────────

impl WriteToBytes for TimestampFormat {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<BE>(self.seconds)?;
        writer.write_u32::<BE>(self.fraction)
    }
}

impl ReadFromBytes for TimestampFormat {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        Ok(TimestampFormat {
            seconds: reader.read_u32::<BE>()?,
            fraction: reader.read_u32::<BE>()?,
        })
    }
}

impl WriteToBytes for Stratum {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u8(self.0)
    }
}

impl ReadFromBytes for Stratum {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        reader.read_u8().map(Stratum)
    }
}

/// LI in bits 6-7, VN in bits 3-5, mode in bits 0-2.
impl WriteToBytes for PacketByte1 {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        let (li, vn, mode) = *self;
        writer.write_u8((li as u8) << 6 | (vn.value() & 0b111) << 3 | mode as u8)
    }
}

impl ReadFromBytes for PacketByte1 {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let byte = reader.read_u8()?;
        Ok((
            LeapIndicator::from_bits(byte >> 6),
            Version::from_bits(byte >> 3),
            Mode::from_bits(byte),
        ))
    }
}

// ── Packet ──────────────────────────────────────────────────────────

impl WriteToBytes for Packet {
    fn write_to_bytes<W: WriteBytesExt>(&self, mut writer: W) -> io::Result<()> {
        writer.write_bytes((self.leap_indicator, self.version, self.mode))?;
        writer.write_bytes(self.stratum)?;
        writer.write_i8(self.poll)?;
        writer.write_i8(self.precision)?;
        writer.write_i32::<BE>(self.root_delay)?;
        writer.write_u32::<BE>(self.root_dispersion)?;
        writer.write_u32::<BE>(self.reference_id)?;
        for ts in [
            &self.reference_timestamp,
            &self.origin_timestamp,
            &self.receive_timestamp,
            &self.transmit_timestamp,
        ] {
            writer.write_bytes(ts)?;
        }
        Ok(())
    }
}

impl ReadFromBytes for Packet {
    fn read_from_bytes<R: ReadBytesExt>(mut reader: R) -> io::Result<Self> {
        let (leap_indicator, version, mode) = reader.read_bytes::<PacketByte1>()?;
        Ok(Packet {
            leap_indicator,
            version,
            mode,
            stratum: reader.read_bytes()?,
            poll: reader.read_i8()?,
            precision: reader.read_i8()?,
            root_delay: reader.read_i32::<BE>()?,
            root_dispersion: reader.read_u32::<BE>()?,
            reference_id: reader.read_u32::<BE>()?,
            reference_timestamp: reader.read_bytes()?,
            origin_timestamp: reader.read_bytes()?,
            receive_timestamp: reader.read_bytes()?,
            transmit_timestamp: reader.read_bytes()?,
        })
    }
}

impl Packet {
    /// The fixed 48-byte wire form.
    pub fn encode(&self) -> io::Result<[u8; Packet::PACKED_SIZE_BYTES]> {
        let mut buf = [0u8; Packet::PACKED_SIZE_BYTES];
        (&mut buf[..]).write_bytes(self)?;
        Ok(buf)
    }

    /// Decode the leading 48 bytes of a datagram; anything after them is ignored.
    ///
    /// Every bit pattern of the header is a valid packet, so length is the only failure.
    pub fn decode(buf: &[u8]) -> Result<Packet, ParseError> {
        let too_short = || ParseError::BufferTooShort {
            needed: Packet::PACKED_SIZE_BYTES,
            available: buf.len(),
        };
        let mut header = buf.get(..Packet::PACKED_SIZE_BYTES).ok_or_else(too_short)?;
        header.read_bytes::<Packet>().map_err(|_| too_short())
    }
}
