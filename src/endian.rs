//! Byte order of multi-byte stream fields.
//!
//! A stream uses one order for every field, header included. The header holds
//! no order marker, so reader and writer must agree out of band; the default
//! is little-endian.

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// Byte order for all multi-byte fields of a stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

macro_rules! ordered_io {
    ($($read:ident, $write:ident, $ty:ty);* $(;)?) => {
        impl Endianness {
            $(
                #[inline]
                pub(crate) fn $read<R: Read + ?Sized>(self, source: &mut R) -> io::Result<$ty> {
                    match self {
                        Endianness::Little => source.$read::<LittleEndian>(),
                        Endianness::Big => source.$read::<BigEndian>(),
                    }
                }

                #[inline]
                pub(crate) fn $write<W: Write + ?Sized>(
                    self,
                    sink: &mut W,
                    value: $ty,
                ) -> io::Result<()> {
                    match self {
                        Endianness::Little => sink.$write::<LittleEndian>(value),
                        Endianness::Big => sink.$write::<BigEndian>(value),
                    }
                }
            )*
        }
    };
}

ordered_io! {
    read_u32, write_u32, u32;
    read_u64, write_u64, u64;
    read_i32, write_i32, i32;
    read_i64, write_i64, i64;
    read_f32, write_f32, f32;
    read_f64, write_f64, f64;
}

impl Endianness {
    /// Read an unsigned integer of `nbytes` (1..=8) bytes.
    #[inline]
    pub(crate) fn read_uint<R: Read + ?Sized>(
        self,
        source: &mut R,
        nbytes: usize,
    ) -> io::Result<u64> {
        match self {
            Endianness::Little => source.read_uint::<LittleEndian>(nbytes),
            Endianness::Big => source.read_uint::<BigEndian>(nbytes),
        }
    }

    /// Write `value` as an unsigned integer of `nbytes` (1..=8) bytes.
    ///
    /// The caller guarantees `value` fits.
    #[inline]
    pub(crate) fn write_uint<W: Write + ?Sized>(
        self,
        sink: &mut W,
        value: u64,
        nbytes: usize,
    ) -> io::Result<()> {
        match self {
            Endianness::Little => sink.write_uint::<LittleEndian>(value, nbytes),
            Endianness::Big => sink.write_uint::<BigEndian>(value, nbytes),
        }
    }

    /// Decode an unsigned integer from an already filled buffer.
    #[inline]
    pub(crate) fn decode_uint(self, buf: &[u8]) -> u64 {
        match self {
            Endianness::Little => LittleEndian::read_uint(buf, buf.len()),
            Endianness::Big => BigEndian::read_uint(buf, buf.len()),
        }
    }
}
