//! Bounded bitstream reader for packet parsing.
//!
//! The reader is always created over the declared packet window, never over
//! the caller's whole buffer, so any read past the declared length surfaces
//! as [`io::ErrorKind::UnexpectedEof`] instead of touching foreign bytes.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "get_n({}): out of bounds bits at {}",
                    n,
                    self.bs.position_in_bits().unwrap_or(0)
                ),
            )),
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn get_u8(&mut self) -> io::Result<u8> {
        self.get_n::<u8>(8)
    }

    /// Fills `buf` from the current position.
    ///
    /// Fails without consuming anything when fewer than `buf.len()` bytes
    /// remain in the window.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let needed = (buf.len() as u64) << 3;
        if needed > self.available()? {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read_bytes({}): out of bounds bits at {}",
                    buf.len(),
                    self.position()?
                ),
            ));
        }

        self.bs.read_bytes(buf)
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs
            .position_in_bits()
            .map(|pos| self.len.saturating_sub(pos))
    }

    #[inline(always)]
    pub fn available_bytes(&mut self) -> io::Result<usize> {
        self.available().map(|bits| (bits >> 3) as usize)
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }

    #[inline(always)]
    pub fn byte_position(&mut self) -> io::Result<usize> {
        self.position().map(|bits| (bits >> 3) as usize)
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fields_msb_first() -> io::Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0b1100_0011, 0xAB]);

        assert!(reader.get()?);
        assert!(reader.get()?);
        assert_eq!(reader.get_n::<u8>(6)?, 3);
        assert_eq!(reader.byte_position()?, 1);
        assert_eq!(reader.available_bytes()?, 1);
        assert_eq!(reader.get_u8()?, 0xAB);
        assert_eq!(reader.available()?, 0);

        Ok(())
    }

    #[test]
    fn stops_at_window_end() {
        let mut reader = BsIoSliceReader::from_slice(&[1, 2, 3]);
        let mut buf = [0u8; 4];

        let err = reader.read_bytes(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(reader.position().unwrap(), 0);

        let mut buf = [0u8; 3];
        reader.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert!(reader.get_u8().is_err());
    }
}
