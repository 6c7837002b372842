use std::io;
use std::sync::Arc;

use log::{debug, trace};

use crate::structs::packet::{
    FrameLayout, Framing, MAX_FRAMES, MAX_PACKET_SAMPLES, PacketRef, ParsedPacket,
};
use crate::structs::toc::{FrameCountCode, REFERENCE_SAMPLE_RATE, Toc};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{ArgumentError, FramingError, PacketError};
use crate::utils::size::{MAX_FRAME_SIZE, read_padding, read_size};

/// Splits packets into their frames.
///
/// Parsing happens in two steps. [`Framer::layout`] validates the header,
/// size and padding fields and produces a [`FrameLayout`] without touching the
/// frame payloads. [`Framer::parse`] and [`Framer::parse_ref`] then walk that
/// layout to copy out or borrow the frames.
///
/// Every read is confined to `buffer[offset..offset + length]`. A packet that
/// fails any check produces an error and nothing else.
///
/// # Example
///
/// ```rust
/// use opuspkt::process::parse::Framer;
/// use opuspkt::structs::packet::Framing;
///
/// // TOC with code 1 followed by two 2-byte frames.
/// let data = [0x09, 0xAA, 0xBB, 0xCC, 0xDD];
///
/// let packet = Framer::new(Framing::Standard).parse(&data, 0, data.len())?;
/// assert_eq!(packet.frame_count(), 2);
/// assert_eq!(&packet.frames()[1][..], &[0xCC, 0xDD]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Framer {
    framing: Framing,
}

impl Framer {
    pub fn new(framing: Framing) -> Self {
        Self { framing }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Validates the packet at `buffer[offset..offset + length]` and returns
    /// where its frames are.
    pub fn layout(
        &self,
        buffer: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<FrameLayout, PacketError> {
        let window = packet_window(buffer, offset, length)?;
        let reader = &mut BsIoSliceReader::from_slice(window);

        self.read_layout(reader, length)
    }

    /// Parses the packet and copies every frame out of `buffer`.
    pub fn parse(
        &self,
        buffer: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<ParsedPacket, PacketError> {
        let window = packet_window(buffer, offset, length)?;
        let reader = &mut BsIoSliceReader::from_slice(window);

        let layout = self.read_layout(reader, length)?;

        let mut frames = Vec::with_capacity(layout.frame_count());
        for &size in layout.frame_sizes() {
            let mut frame = vec![0u8; size];
            reader.read_bytes(&mut frame).map_err(truncated)?;
            frames.push(Arc::from(frame));
        }

        Ok(ParsedPacket::new(layout, frames))
    }

    /// Parses the packet and borrows its frames from `buffer`.
    pub fn parse_ref<'a>(
        &self,
        buffer: &'a [u8],
        offset: usize,
        length: usize,
    ) -> Result<PacketRef<'a>, PacketError> {
        let window = packet_window(buffer, offset, length)?;
        let reader = &mut BsIoSliceReader::from_slice(window);

        let layout = self.read_layout(reader, length)?;

        Ok(PacketRef::new(layout, window))
    }

    fn read_layout(
        &self,
        reader: &mut BsIoSliceReader,
        length: usize,
    ) -> Result<FrameLayout, PacketError> {
        if length == 0 {
            debug!("zero-length packet");
            return Err(FramingError::EmptyPacket.into());
        }

        let self_delimited = self.framing.is_self_delimited();

        let toc = Toc::from(reader.get_u8().map_err(truncated)?);
        let mut len = length - 1;
        let mut last_size = len;

        let mut sizes = [0usize; MAX_FRAMES];
        let mut padding = 0;
        let mut cbr = false;

        let count = match toc.frame_count_code() {
            FrameCountCode::Single => 1,
            FrameCountCode::TwoEqual => {
                cbr = true;
                if !self_delimited {
                    if len & 1 != 0 {
                        debug!("code 1 payload of {len} bytes cannot be split in two");
                        return Err(FramingError::OddCbrPayload(len).into());
                    }
                    last_size = len / 2;
                    sizes[0] = last_size;
                }
                2
            }
            FrameCountCode::TwoVariable => {
                let (size, bytes) = read_size(reader, len)?;
                len -= bytes;
                if size > len {
                    debug!("first frame of {size} bytes overruns the {len} bytes left");
                    return Err(FramingError::FrameSizeOverflow {
                        size,
                        remaining: len,
                    }
                    .into());
                }
                sizes[0] = size;
                last_size = len - size;
                2
            }
            FrameCountCode::Arbitrary => {
                if len < 1 {
                    debug!("code 3 packet without frame count byte");
                    return Err(FramingError::MissingFrameCount.into());
                }

                let vbr = reader.get().map_err(truncated)?;
                let padded = reader.get().map_err(truncated)?;
                let count = reader.get_n::<u8>(6).map_err(truncated)? as usize;
                len -= 1;

                if count == 0 {
                    debug!("code 3 packet announces zero frames");
                    return Err(FramingError::ZeroFrames.into());
                }

                let samples_per_frame = toc.samples_per_frame(REFERENCE_SAMPLE_RATE);
                if count * samples_per_frame > MAX_PACKET_SAMPLES {
                    debug!("{count} frames of {samples_per_frame} samples exceed 120 ms");
                    return Err(FramingError::DurationExceeded {
                        frames: count,
                        samples_per_frame,
                    }
                    .into());
                }

                if padded {
                    let field = read_padding(reader, len)?;
                    len -= field.total();
                    padding = field.len;
                }

                cbr = !vbr;
                last_size = len;

                if vbr {
                    for size_slot in sizes.iter_mut().take(count - 1) {
                        let (size, bytes) = read_size(reader, len)?;
                        len -= bytes;
                        if size > len {
                            debug!("frame of {size} bytes overruns the {len} bytes left");
                            return Err(FramingError::FrameSizeOverflow {
                                size,
                                remaining: len,
                            }
                            .into());
                        }
                        *size_slot = size;
                        let Some(rest) = last_size.checked_sub(bytes + size) else {
                            debug!("explicit frame sizes leave no room for the last frame");
                            return Err(FramingError::LastFrameUnderflow.into());
                        };
                        last_size = rest;
                    }
                } else if !self_delimited {
                    last_size = len / count;
                    if last_size * count != len {
                        debug!("CBR payload of {len} bytes does not split into {count} frames");
                        return Err(FramingError::CbrRemainder { len, frames: count }.into());
                    }
                    sizes[..count - 1].fill(last_size);
                }

                count
            }
        };

        if self_delimited {
            let (size, bytes) = read_size(reader, len)?;
            len -= bytes;
            if size > len {
                debug!("self-delimited size {size} overruns the {len} bytes left");
                return Err(FramingError::SelfDelimitedOverflow {
                    size,
                    available: len,
                }
                .into());
            }

            if cbr {
                if size * count > len {
                    debug!("{count} frames of {size} bytes overrun the {len} bytes left");
                    return Err(FramingError::SelfDelimitedOverflow {
                        size: size * count,
                        available: len,
                    }
                    .into());
                }
                sizes[..count].fill(size);
            } else {
                if bytes + size > last_size {
                    debug!("last frame of {size} bytes overruns the {last_size} bytes left");
                    return Err(FramingError::SelfDelimitedOverflow {
                        size,
                        available: last_size.saturating_sub(bytes),
                    }
                    .into());
                }
                sizes[count - 1] = size;
            }
        } else {
            if last_size > MAX_FRAME_SIZE {
                debug!("implicit last frame of {last_size} bytes exceeds {MAX_FRAME_SIZE}");
                return Err(FramingError::FrameTooLarge(last_size).into());
            }
            sizes[count - 1] = last_size;
        }

        let payload_offset = reader.byte_position().map_err(truncated)?;
        let payload_len = sizes[..count].iter().sum::<usize>();
        let packet_len = payload_offset + payload_len + padding;

        if packet_len > length {
            debug!("layout needs {packet_len} bytes, packet has {length}");
            return Err(FramingError::Truncated.into());
        }

        let layout = FrameLayout {
            toc,
            framing: self.framing,
            cbr,
            sizes,
            count,
            padding,
            payload_offset,
            packet_len,
        };

        trace!(
            "{toc}: frames {:?} at {payload_offset}, padding {padding}, {packet_len} bytes",
            layout.frame_sizes()
        );

        Ok(layout)
    }
}

/// Parses a packet with standard framing, copying its frames out.
pub fn parse_packet(
    buffer: &[u8],
    offset: usize,
    length: usize,
) -> Result<ParsedPacket, PacketError> {
    Framer::default().parse(buffer, offset, length)
}

/// Parses a self-delimited packet that starts at `offset` and ends somewhere
/// within the next `length` bytes.
pub fn parse_self_delimited(
    buffer: &[u8],
    offset: usize,
    length: usize,
) -> Result<ParsedPacket, PacketError> {
    Framer::new(Framing::SelfDelimited).parse(buffer, offset, length)
}

/// The declared packet bytes, or an argument error when they do not lie
/// within `buffer`.
pub(crate) fn packet_window(
    buffer: &[u8],
    offset: usize,
    length: usize,
) -> Result<&[u8], PacketError> {
    let buffer_len = buffer.len();

    if offset > buffer_len {
        let err = ArgumentError::OffsetOutOfRange { offset, buffer_len };
        return Err(err.into());
    }

    match offset.checked_add(length) {
        Some(end) if end <= buffer_len => Ok(&buffer[offset..end]),
        _ => Err(ArgumentError::LengthOutOfRange {
            offset,
            length,
            buffer_len,
        }
        .into()),
    }
}

fn truncated(err: io::Error) -> PacketError {
    debug!("{err}");
    FramingError::Truncated.into()
}
