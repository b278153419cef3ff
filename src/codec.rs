//! Byte-order and variable-length integer helpers shared by the header and track chunk codecs.
//!
//! Everything here works on any `std::io::Read`/`std::io::Write`; nothing touches the filesystem.

use crate::error::{Error, Result};
use std::io::{self, Read, Write};
use std::mem::size_of;

/// A fixed-width integer that can be moved through a byte stream in either byte order.
pub trait FixedWidth: Copy {
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default;

    fn from_be_bytes(bytes: Self::Bytes) -> Self;
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    fn to_be_bytes(self) -> Self::Bytes;
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_fixed_width {
    ($($int:ty),* $(,)?) => {
        $(
            impl FixedWidth for $int {
                type Bytes = [u8; size_of::<$int>()];

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$int>::from_be_bytes(bytes)
                }

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$int>::from_le_bytes(bytes)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$int>::to_be_bytes(self)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$int>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_fixed_width!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Reads exactly `N` bytes, failing with [`Error::UnexpectedEndOfStream`] on a short read.
pub fn read_bytes<const N: usize, R: Read>(stream: &mut R) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    stream.read_exact(&mut bytes)?;
    Ok(bytes)
}

pub fn read_big_endian<T: FixedWidth, R: Read>(stream: &mut R) -> Result<T> {
    let mut bytes = T::Bytes::default();
    stream.read_exact(bytes.as_mut())?;
    Ok(T::from_be_bytes(bytes))
}

pub fn read_little_endian<T: FixedWidth, R: Read>(stream: &mut R) -> Result<T> {
    let mut bytes = T::Bytes::default();
    stream.read_exact(bytes.as_mut())?;
    Ok(T::from_le_bytes(bytes))
}

pub fn write_big_endian<T: FixedWidth, W: Write>(value: T, stream: &mut W) -> Result<()> {
    stream.write_all(value.to_be_bytes().as_ref())?;
    Ok(())
}

pub fn write_little_endian<T: FixedWidth, W: Write>(value: T, stream: &mut W) -> Result<()> {
    stream.write_all(value.to_le_bytes().as_ref())?;
    Ok(())
}

/// Discards exactly `count` bytes from the stream.
pub fn skip_bytes<R: Read>(count: u64, stream: &mut R) -> Result<()> {
    let skipped = io::copy(&mut stream.by_ref().take(count), &mut io::sink())?;
    if skipped < count {
        return Err(Error::UnexpectedEndOfStream);
    }

    Ok(())
}

/// Decodes a MIDI variable-length quantity into `T`.
///
/// Each byte contributes its low 7 bits, most significant group first, and a set high bit
/// means another byte follows. At most `ceil(8 * size_of::<T>() / 7)` bytes are accepted so that
/// every value of `T` can be represented; running past that budget, or decoding a value that
/// does not fit `T`, fails with [`Error::InvalidVariableCount`].
pub fn read_variable_count<T, R>(stream: &mut R) -> Result<T>
where
    T: FixedWidth + TryFrom<u128>,
    R: Read,
{
    let budget = (8 * size_of::<T>()).div_ceil(7);
    let mut result: u128 = 0;

    for _ in 0..budget {
        let [byte] = read_bytes::<1, _>(stream)?;
        result = (result << 7) | u128::from(byte & 0x7F);

        if byte & 0x80 == 0 {
            return T::try_from(result).map_err(|_| Error::InvalidVariableCount);
        }
    }

    Err(Error::InvalidVariableCount)
}

/// Encodes `value` as a MIDI variable-length quantity using the fewest bytes possible.
/// Returns how many bytes were written.
pub fn write_variable_count<T: Into<u64>, W: Write>(value: T, stream: &mut W) -> Result<usize> {
    let mut value: u64 = value.into();
    let mut buffer = [0u8; 10];
    let mut start = buffer.len() - 1;

    buffer[start] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        start -= 1;
        buffer[start] = 0x80 | (value & 0x7F) as u8;
        value >>= 7;
    }

    stream.write_all(&buffer[start..])?;
    Ok(buffer.len() - start)
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn encode(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_variable_count(value, &mut out).unwrap();
        out
    }

    #[test]
    fn read_bytes_exact() {
        let mut stream = Cursor::new(b"MThd\x00".to_vec());
        assert_eq!(read_bytes::<4, _>(&mut stream).unwrap(), *b"MThd");
        assert_eq!(read_bytes::<1, _>(&mut stream).unwrap(), [0]);
    }

    #[test]
    fn read_bytes_short_stream() {
        let mut stream = Cursor::new(b"MTh".to_vec());
        let result = read_bytes::<4, _>(&mut stream);
        assert!(matches!(result, Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn big_endian_reads() {
        let mut stream = Cursor::new(vec![0x00, 0x00, 0x00, 0x06, 0x01, 0xE0, 0xFF, 0xFE]);
        assert_eq!(read_big_endian::<u32, _>(&mut stream).unwrap(), 6);
        assert_eq!(read_big_endian::<i16, _>(&mut stream).unwrap(), 480);
        assert_eq!(read_big_endian::<i16, _>(&mut stream).unwrap(), -2);
    }

    #[test]
    fn little_endian_reads() {
        let mut stream = Cursor::new(vec![0xE0, 0x01, 0x06, 0x00, 0x00, 0x00]);
        assert_eq!(read_little_endian::<u16, _>(&mut stream).unwrap(), 480);
        assert_eq!(read_little_endian::<i32, _>(&mut stream).unwrap(), 6);
    }

    #[test]
    fn byte_order_writes() {
        let mut out = Vec::new();
        write_big_endian(0x0102_0304u32, &mut out).unwrap();
        write_little_endian(0x0102_0304u32, &mut out).unwrap();
        write_big_endian(-1i8, &mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 4, 3, 2, 1, 0xFF]);
    }

    #[test]
    fn big_endian_short_stream() {
        let mut stream = Cursor::new(vec![0x00, 0x01]);
        let result = read_big_endian::<u32, _>(&mut stream);
        assert!(matches!(result, Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn skip_past_bytes() {
        let mut stream = Cursor::new(vec![1, 2, 3, 4]);
        skip_bytes(3, &mut stream).unwrap();
        assert_eq!(read_bytes::<1, _>(&mut stream).unwrap(), [4]);
        assert!(matches!(
            skip_bytes(1, &mut stream),
            Err(Error::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn known_variable_counts() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(0x40), vec![0x40]);
        assert_eq!(encode(0x7F), vec![0x7F]);
        assert_eq!(encode(0x80), vec![0x81, 0x00]);
        assert_eq!(encode(0x2000), vec![0xC0, 0x00]);
        assert_eq!(encode(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(encode(0x4000), vec![0x81, 0x80, 0x00]);
        assert_eq!(encode(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn variable_count_without_terminator() {
        let mut stream = Cursor::new(vec![0x81, 0x81, 0x81, 0x81, 0x81, 0x00]);
        let result = read_variable_count::<u32, _>(&mut stream);
        assert!(matches!(result, Err(Error::InvalidVariableCount)));

        let mut stream = Cursor::new(vec![0x81, 0x81, 0x00]);
        let result = read_variable_count::<u8, _>(&mut stream);
        assert!(matches!(result, Err(Error::InvalidVariableCount)));
    }

    #[test]
    fn variable_count_too_wide_for_type() {
        // Two bytes are within the u8 budget but decode to 0x100.
        let mut stream = Cursor::new(vec![0x82, 0x00]);
        let result = read_variable_count::<u8, _>(&mut stream);
        assert!(matches!(result, Err(Error::InvalidVariableCount)));
    }

    #[test]
    fn variable_count_truncated() {
        let mut stream = Cursor::new(vec![0x81, 0x80]);
        let result = read_variable_count::<u32, _>(&mut stream);
        assert!(matches!(result, Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn variable_count_reads_leave_trailing_bytes() {
        let mut stream = Cursor::new(vec![0x83, 0x60, 0x90]);
        assert_eq!(read_variable_count::<u32, _>(&mut stream).unwrap(), 480);
        assert_eq!(read_bytes::<1, _>(&mut stream).unwrap(), [0x90]);
    }

    #[test]
    fn u64_extremes() {
        let mut out = Vec::new();
        assert_eq!(write_variable_count(u64::MAX, &mut out).unwrap(), 10);
        let decoded = read_variable_count::<u64, _>(&mut Cursor::new(out)).unwrap();
        assert_eq!(decoded, u64::MAX);
    }

    proptest! {
        #[test]
        fn variable_count_round_trip(value in any::<u32>()) {
            let bytes = encode(value);
            let decoded = read_variable_count::<u32, _>(&mut Cursor::new(&bytes)).unwrap();
            prop_assert_eq!(decoded, value);
            if value < 128 {
                prop_assert_eq!(bytes.len(), 1);
            }
        }
    }
}
