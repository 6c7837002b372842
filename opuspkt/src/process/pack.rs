use std::sync::Arc;

use log::trace;

use crate::process::parse::parse_packet;
use crate::structs::packet::{Framing, MAX_FRAMES, MAX_PACKET_SAMPLES, ParsedPacket};
use crate::structs::toc::{FrameCountCode, REFERENCE_SAMPLE_RATE, Toc};
use crate::utils::errors::{ArgumentError, FramingError, PacketError};
use crate::utils::size::{MAX_FRAME_SIZE, write_padding, write_size};

/// Assembles frames into a single packet.
///
/// All frames share the configuration and channel count of the TOC the
/// builder was created with. The shortest frame count code that can carry the
/// frames is chosen automatically: code 0 for one frame, code 1 for two equal
/// frames, code 2 for two unequal frames and code 3 otherwise. Padding always
/// requires code 3.
///
/// # Example
///
/// ```rust
/// use opuspkt::process::pack::PacketBuilder;
/// use opuspkt::process::parse::parse_packet;
/// use opuspkt::structs::toc::{FrameCountCode, Toc};
///
/// let toc = Toc::new(9, false, FrameCountCode::Single);
///
/// let mut builder = PacketBuilder::new(toc);
/// builder.push_frame(&[1, 2, 3])?;
/// builder.push_frame(&[4])?;
///
/// let data = builder.build()?;
/// assert_eq!(data, [0x4A, 3, 1, 2, 3, 4]);
///
/// let packet = parse_packet(&data, 0, data.len())?;
/// assert_eq!(packet.frame_count(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    toc: Toc,
    frames: Vec<Arc<[u8]>>,
    framing: Framing,
    padding: usize,
    force_code3: bool,
}

impl PacketBuilder {
    pub fn new(toc: Toc) -> Self {
        Self {
            toc,
            frames: Vec::new(),
            framing: Framing::Standard,
            padding: 0,
            force_code3: false,
        }
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Pads the packet by `amount` bytes, padding length field included.
    pub fn with_padding(mut self, amount: usize) -> Self {
        self.padding = amount;
        self
    }

    /// Emits a frame count byte even when a shorter code would do.
    pub fn with_code3(mut self) -> Self {
        self.force_code3 = true;
        self
    }

    pub fn toc(&self) -> Toc {
        self.toc
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Appends one frame.
    pub fn push_frame(&mut self, frame: &[u8]) -> Result<(), PacketError> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(ArgumentError::SizeOutOfRange(frame.len()).into());
        }

        self.check_room(1)?;
        self.frames.push(Arc::from(frame));

        Ok(())
    }

    /// Appends every frame of `packet`.
    ///
    /// The packet must use the same configuration and channel count as the
    /// builder's TOC. Nothing is appended when any check fails.
    pub fn push_packet(&mut self, packet: &ParsedPacket) -> Result<(), PacketError> {
        if !self.toc.is_compatible(packet.toc()) {
            return Err(FramingError::TocMismatch {
                expected: self.toc.byte(),
                found: packet.toc_byte(),
            }
            .into());
        }

        self.check_room(packet.frame_count())?;
        self.frames.extend(packet.frames().iter().cloned());

        Ok(())
    }

    fn check_room(&self, additional: usize) -> Result<(), PacketError> {
        let count = self.frames.len() + additional;
        if count > MAX_FRAMES {
            return Err(FramingError::TooManyFrames.into());
        }

        let samples_per_frame = self.toc.samples_per_frame(REFERENCE_SAMPLE_RATE);
        if count * samples_per_frame > MAX_PACKET_SAMPLES {
            return Err(FramingError::DurationExceeded {
                frames: count,
                samples_per_frame,
            }
            .into());
        }

        Ok(())
    }

    /// Writes the packet to a new buffer.
    pub fn build(&self) -> Result<Vec<u8>, PacketError> {
        let mut out = Vec::new();
        self.write(&mut out)?;

        Ok(out)
    }

    /// Writes the packet padded to exactly `len` bytes, replacing any padding
    /// set with [`PacketBuilder::with_padding`].
    pub fn build_padded(&self, len: usize) -> Result<Vec<u8>, PacketError> {
        let shortest = self.clone().with_padding(0).build()?;
        if len < shortest.len() {
            return Err(ArgumentError::PaddedLengthTooShort {
                requested: len,
                minimum: shortest.len(),
            }
            .into());
        }
        if len == shortest.len() {
            return Ok(shortest);
        }

        // Code 3 costs at most one byte over the shortest form, so `len` covers it.
        let code3 = self.clone().with_padding(0).with_code3();
        let unpadded = code3.build()?.len();

        code3.with_padding(len - unpadded).build()
    }

    /// Appends the packet to `out`, returning the bytes written.
    pub fn write(&self, out: &mut Vec<u8>) -> Result<usize, PacketError> {
        let Some(last) = self.frames.last() else {
            return Err(ArgumentError::NoFrames.into());
        };

        let start = out.len();
        let count = self.frames.len();
        let cbr = self.frames.iter().all(|frame| frame.len() == last.len());

        let code = if count > 2 || self.padding > 0 || self.force_code3 {
            FrameCountCode::Arbitrary
        } else if count == 1 {
            FrameCountCode::Single
        } else if cbr {
            FrameCountCode::TwoEqual
        } else {
            FrameCountCode::TwoVariable
        };

        out.push(self.toc.with_code(code).byte());

        let mut filler = 0;
        match code {
            FrameCountCode::Single | FrameCountCode::TwoEqual => {}
            FrameCountCode::TwoVariable => {
                write_size(self.frames[0].len(), out)?;
            }
            FrameCountCode::Arbitrary => {
                let mut count_byte = count as u8;
                if !cbr {
                    count_byte |= 0x80;
                }
                if self.padding > 0 {
                    count_byte |= 0x40;
                }
                out.push(count_byte);

                if self.padding > 0 {
                    filler = write_padding(self.padding, out)?;
                }

                if !cbr {
                    for frame in &self.frames[..count - 1] {
                        write_size(frame.len(), out)?;
                    }
                }
            }
        }

        if self.framing.is_self_delimited() {
            write_size(last.len(), out)?;
        }

        for frame in &self.frames {
            out.extend_from_slice(frame);
        }
        out.resize(out.len() + filler, 0);

        let written = out.len() - start;
        trace!(
            "built {written} byte packet: {count} frames, code {}, padding {}",
            code as u8,
            self.padding
        );

        Ok(written)
    }
}

/// Re-emits `packet` padded to exactly `new_len` bytes.
///
/// The frames are unchanged. A packet that already has the requested length
/// is returned as is.
pub fn pad(packet: &[u8], new_len: usize) -> Result<Vec<u8>, PacketError> {
    if new_len < packet.len() {
        return Err(ArgumentError::PaddedLengthTooShort {
            requested: new_len,
            minimum: packet.len(),
        }
        .into());
    }

    let parsed = parse_packet(packet, 0, packet.len())?;
    if new_len == packet.len() {
        return Ok(packet.to_vec());
    }

    let mut builder = PacketBuilder::new(parsed.toc());
    builder.push_packet(&parsed)?;
    builder.build_padded(new_len)
}

/// Re-emits `packet` without padding, in its shortest form.
pub fn unpad(packet: &[u8]) -> Result<Vec<u8>, PacketError> {
    let parsed = parse_packet(packet, 0, packet.len())?;

    let mut builder = PacketBuilder::new(parsed.toc());
    builder.push_packet(&parsed)?;
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse::{Framer, parse_self_delimited};

    fn toc() -> Toc {
        // SILK wideband 20 ms, stereo.
        Toc::new(9, true, FrameCountCode::Single)
    }

    fn builder_with(frames: &[&[u8]]) -> anyhow::Result<PacketBuilder> {
        let mut builder = PacketBuilder::new(toc());
        for frame in frames {
            builder.push_frame(frame)?;
        }
        Ok(builder)
    }

    fn frames_of(packet: &ParsedPacket) -> Vec<Vec<u8>> {
        packet.frames().iter().map(|frame| frame.to_vec()).collect()
    }

    #[test]
    fn chooses_shortest_code() -> anyhow::Result<()> {
        let cases: [(&[&[u8]], u8); 5] = [
            (&[&[1, 2]], 0),
            (&[&[1, 2], &[3, 4]], 1),
            (&[&[1, 2], &[3]], 2),
            (&[&[1], &[2], &[3]], 3),
            (&[&[1], &[2, 2], &[3]], 3),
        ];

        for (frames, code) in cases {
            let data = builder_with(frames)?.build()?;
            assert_eq!(data[0] & 0x3, code);
            assert_eq!(data[0] & 0xFC, toc().byte());
        }

        let data = builder_with(&[&[1], &[2], &[3]])?.build()?;
        assert_eq!(data, [0x4F, 0x03, 1, 2, 3]);

        let data = builder_with(&[&[1], &[2, 2], &[3]])?.build()?;
        assert_eq!(data, [0x4F, 0x83, 1, 2, 1, 2, 2, 3]);

        Ok(())
    }

    #[test]
    fn built_packets_parse_back() -> anyhow::Result<()> {
        let big = vec![0x5A; 700];
        let cases: [&[&[u8]]; 6] = [
            &[&[]],
            &[&[1, 2, 3]],
            &[&big, &big],
            &[&big, &[9; 3]],
            &[&[1; 10], &[2; 10], &[3; 10]],
            &[&[1; 10], &big, &[], &[4; 252]],
        ];

        for frames in cases {
            for framing in [Framing::Standard, Framing::SelfDelimited] {
                for padding in [0, 1, 300] {
                    let builder = builder_with(frames)?
                        .with_framing(framing)
                        .with_padding(padding);
                    let mut data = builder.build()?;
                    let len = data.len();

                    // Self-delimited packets must not depend on what follows.
                    data.extend_from_slice(&[0xEE; 4]);
                    let length = if framing.is_self_delimited() {
                        data.len()
                    } else {
                        len
                    };

                    let packet = Framer::new(framing).parse(&data, 0, length)?;
                    let expected = frames.iter().map(|frame| frame.to_vec());

                    assert_eq!(frames_of(&packet), expected.collect::<Vec<_>>());
                    assert_eq!(packet.packet_len(), len);
                    assert_eq!(packet.toc().config(), 9);
                    assert!(packet.toc().is_stereo());
                    if padding > 0 {
                        let unpadded = builder_with(frames)?
                            .with_framing(framing)
                            .with_code3()
                            .build()?;
                        assert_eq!(len, unpadded.len() + padding);
                    }
                }
            }
        }

        Ok(())
    }

    #[test]
    fn push_limits() -> anyhow::Result<()> {
        let mut builder = PacketBuilder::new(toc());
        assert_eq!(builder.build().unwrap_err(), ArgumentError::NoFrames.into());
        assert_eq!(
            builder.push_frame(&[0; 1276]).unwrap_err(),
            ArgumentError::SizeOutOfRange(1276).into()
        );

        for _ in 0..6 {
            builder.push_frame(&[0])?;
        }
        assert_eq!(
            builder.push_frame(&[0]).unwrap_err(),
            FramingError::DurationExceeded {
                frames: 7,
                samples_per_frame: 960
            }
            .into()
        );

        let mut builder = PacketBuilder::new(Toc::new(16, false, FrameCountCode::Single));
        for _ in 0..MAX_FRAMES {
            builder.push_frame(&[])?;
        }
        assert_eq!(
            builder.push_frame(&[]).unwrap_err(),
            FramingError::TooManyFrames.into()
        );

        Ok(())
    }

    #[test]
    fn merges_packets() -> anyhow::Result<()> {
        let first = builder_with(&[&[1, 1]])?.build()?;
        let second = builder_with(&[&[2], &[3, 3, 3]])?.build()?;

        let mut builder = PacketBuilder::new(toc());
        for data in [&first, &second] {
            builder.push_packet(&parse_packet(data, 0, data.len())?)?;
        }
        assert_eq!(builder.frame_count(), 3);

        let merged = builder.build()?;
        let packet = parse_packet(&merged, 0, merged.len())?;
        assert_eq!(frames_of(&packet), [vec![1, 1], vec![2], vec![3, 3, 3]]);

        let mut mono = PacketBuilder::new(Toc::new(9, false, FrameCountCode::Single));
        let err = mono.push_packet(&packet).unwrap_err();
        assert!(mono.is_empty());
        assert_eq!(
            err,
            FramingError::TocMismatch {
                expected: 0x48,
                found: packet.toc_byte()
            }
            .into()
        );

        Ok(())
    }

    #[test]
    fn pads_self_delimited() -> anyhow::Result<()> {
        let builder = builder_with(&[&[1; 10], &[2; 12]])?;
        let builder = builder.with_framing(Framing::SelfDelimited);

        for len in [25, 26, 40, 600] {
            let mut data = builder.build_padded(len)?;
            assert_eq!(data.len(), len);

            data.push(0xEE);
            let packet = parse_self_delimited(&data, 0, data.len())?;
            assert_eq!(packet.packet_len(), len);
            assert_eq!(frames_of(&packet), [vec![1; 10], vec![2; 12]]);
        }

        assert!(builder.build_padded(24).unwrap_err().is_bad_argument());

        Ok(())
    }

    #[test]
    fn pad_and_unpad() -> anyhow::Result<()> {
        let original = builder_with(&[&[7; 20]])?.build()?;
        assert_eq!(original.len(), 21);

        for new_len in [21, 22, 23, 100, 300, 1000] {
            let padded = pad(&original, new_len)?;
            assert_eq!(padded.len(), new_len);

            let packet = parse_packet(&padded, 0, padded.len())?;
            assert_eq!(frames_of(&packet), [vec![7; 20]]);

            assert_eq!(unpad(&padded)?, original);
        }

        assert_eq!(
            pad(&original, 20).unwrap_err(),
            ArgumentError::PaddedLengthTooShort {
                requested: 20,
                minimum: 21
            }
            .into()
        );
        assert!(pad(&[0x01, 1, 2, 3], 10).unwrap_err().is_invalid_packet());

        Ok(())
    }
}
