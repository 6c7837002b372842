//! Frame length and padding length fields.
//!
//! Frame lengths use one byte below 252 and two bytes otherwise, for a
//! maximum of 1275. Padding lengths are escape coded: a 255 byte adds 254
//! and continues, any smaller byte adds its value and ends the field.

use log::debug;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{ArgumentError, FramingError, PacketError};

/// Largest frame payload that a size field can describe.
pub const MAX_FRAME_SIZE: usize = 1275;

/// Number of bytes the size field for `size` occupies.
pub const fn size_len(size: usize) -> usize {
    if size < 252 { 1 } else { 2 }
}

/// Encodes `size` into the start of `dst`, returning the bytes written.
pub fn encode_size(size: usize, dst: &mut [u8]) -> Result<usize, PacketError> {
    if size > MAX_FRAME_SIZE {
        return Err(ArgumentError::SizeOutOfRange(size).into());
    }

    let needed = size_len(size);
    if dst.len() < needed {
        return Err(ArgumentError::BufferTooSmall {
            needed,
            available: dst.len(),
        }
        .into());
    }

    if size < 252 {
        dst[0] = size as u8;
    } else {
        let first = 252 + (size & 0x3);
        dst[0] = first as u8;
        dst[1] = ((size - first) >> 2) as u8;
    }

    Ok(needed)
}

/// Appends the size field for `size` to `dst`.
pub fn write_size(size: usize, dst: &mut Vec<u8>) -> Result<usize, PacketError> {
    let mut field = [0u8; 2];
    let written = encode_size(size, &mut field)?;
    dst.extend_from_slice(&field[..written]);

    Ok(written)
}

/// Decodes a size field from `data`, where only the first `len` bytes belong
/// to the packet. Returns `(size, bytes_consumed)`.
pub fn parse_size(data: &[u8], len: usize) -> Result<(usize, usize), PacketError> {
    let window = &data[..len.min(data.len())];
    let reader = &mut BsIoSliceReader::from_slice(window);

    read_size(reader, len)
}

/// Reads a size field at the reader's position. `len` is the logical number of
/// bytes left in the packet, which may be less than the reader holds when
/// trailing padding has already been accounted for.
pub(crate) fn read_size(
    reader: &mut BsIoSliceReader,
    len: usize,
) -> Result<(usize, usize), PacketError> {
    if len < 1 {
        debug!("size field missing: no bytes left");
        return Err(FramingError::TruncatedSize { remaining: len }.into());
    }

    let first = reader.get_u8().map_err(|_| FramingError::Truncated)? as usize;
    if first < 252 {
        return Ok((first, 1));
    }

    if len < 2 {
        debug!("size field truncated after escape byte {first}");
        return Err(FramingError::TruncatedSize { remaining: len }.into());
    }

    let second = reader.get_u8().map_err(|_| FramingError::Truncated)? as usize;

    Ok((4 * second + first, 2))
}

/// Decoded padding length field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    /// Filler bytes at the end of the packet.
    pub len: usize,
    /// Bytes used by the length field itself.
    pub field_len: usize,
}

impl Padding {
    /// Everything the padding adds to the packet.
    pub fn total(&self) -> usize {
        self.len + self.field_len
    }
}

/// Decodes a padding length field from `data`, where only the first `len`
/// bytes belong to the packet.
pub fn parse_padding(data: &[u8], len: usize) -> Result<Padding, PacketError> {
    let window = &data[..len.min(data.len())];
    let reader = &mut BsIoSliceReader::from_slice(window);

    read_padding(reader, len)
}

/// Reads a padding length field. Both the field bytes and the filler they
/// announce must fit in the `len` bytes left.
pub(crate) fn read_padding(
    reader: &mut BsIoSliceReader,
    len: usize,
) -> Result<Padding, PacketError> {
    let mut padding = Padding {
        len: 0,
        field_len: 0,
    };

    loop {
        if padding.total() >= len {
            debug!("padding field runs past the packet ({len} bytes left)");
            return Err(FramingError::PaddingOverflow.into());
        }

        let p = reader.get_u8().map_err(|_| FramingError::Truncated)?;
        padding.field_len += 1;
        padding.len += if p == 255 { 254 } else { p as usize };

        if padding.total() > len {
            debug!(
                "padding of {} bytes does not fit in {len} bytes",
                padding.len
            );
            return Err(FramingError::PaddingOverflow.into());
        }

        if p != 255 {
            return Ok(padding);
        }
    }
}

/// Appends a padding length field that adds exactly `amount` bytes to the
/// packet, counting the field itself. Returns the filler length the caller
/// must append at the end of the packet.
///
/// `amount` must be at least 1; a packet without padding carries no field.
pub fn write_padding(amount: usize, dst: &mut Vec<u8>) -> Result<usize, PacketError> {
    if amount == 0 {
        return Err(ArgumentError::EmptyPadding.into());
    }

    let nb_255s = (amount - 1) / 255;
    dst.extend(std::iter::repeat_n(255u8, nb_255s));

    let last = amount - 255 * nb_255s - 1;
    dst.push(last as u8);

    Ok(amount - nb_255s - 1)
}
