//! Cheap packet queries that look at the header bytes only.
//!
//! None of these walk the frame sizes, but they decode the header through the
//! same [`Toc`] methods the framer uses and reject the same frame counts, so a
//! query never reports something a full parse would disagree with.

use log::debug;

use crate::process::parse::packet_window;
use crate::structs::toc::{Bandwidth, FrameCountCode, Mode, Toc};
use crate::utils::errors::{ArgumentError, FramingError, PacketError};

/// Checks that `sample_rate` is one the frame durations divide evenly.
pub fn check_sample_rate(sample_rate: u32) -> Result<u32, PacketError> {
    if sample_rate == 0 || sample_rate % 400 != 0 {
        return Err(ArgumentError::InvalidSampleRate(sample_rate).into());
    }

    Ok(sample_rate)
}

fn read_toc(buffer: &[u8], offset: usize) -> Result<Toc, PacketError> {
    match buffer.get(offset) {
        Some(&byte) => Ok(Toc::from(byte)),
        None => Err(ArgumentError::OffsetOutOfRange {
            offset,
            buffer_len: buffer.len(),
        }
        .into()),
    }
}

/// Number of frames in the packet at `buffer[offset..offset + length]`.
pub fn get_num_frames(buffer: &[u8], offset: usize, length: usize) -> Result<usize, PacketError> {
    let window = packet_window(buffer, offset, length)?;

    let Some(&toc) = window.first() else {
        return Err(FramingError::EmptyPacket.into());
    };

    match FrameCountCode::from(toc) {
        FrameCountCode::Single => Ok(1),
        FrameCountCode::TwoEqual | FrameCountCode::TwoVariable => Ok(2),
        FrameCountCode::Arbitrary => {
            let Some(&count_byte) = window.get(1) else {
                debug!("code 3 packet without frame count byte");
                return Err(FramingError::MissingFrameCount.into());
            };

            match (count_byte & 0x3F) as usize {
                0 => Err(FramingError::ZeroFrames.into()),
                count => Ok(count),
            }
        }
    }
}

/// Samples per frame at `sample_rate` for the packet at `offset`.
pub fn get_num_samples_per_frame(
    buffer: &[u8],
    offset: usize,
    sample_rate: u32,
) -> Result<usize, PacketError> {
    let sample_rate = check_sample_rate(sample_rate)?;

    Ok(read_toc(buffer, offset)?.samples_per_frame(sample_rate))
}

pub fn get_bandwidth(buffer: &[u8], offset: usize) -> Result<Bandwidth, PacketError> {
    Ok(read_toc(buffer, offset)?.bandwidth())
}

pub fn get_num_encoded_channels(buffer: &[u8], offset: usize) -> Result<usize, PacketError> {
    Ok(read_toc(buffer, offset)?.channels())
}

pub fn get_encoder_mode(buffer: &[u8], offset: usize) -> Result<Mode, PacketError> {
    Ok(read_toc(buffer, offset)?.mode())
}

/// Total samples the packet decodes to at `sample_rate`.
///
/// Fails when the packet would carry more than 120 ms of audio.
pub fn get_num_samples(
    buffer: &[u8],
    offset: usize,
    length: usize,
    sample_rate: u32,
) -> Result<usize, PacketError> {
    let sample_rate = check_sample_rate(sample_rate)?;
    let count = get_num_frames(buffer, offset, length)?;

    let samples = count * read_toc(buffer, offset)?.samples_per_frame(sample_rate);

    // 120 ms is 3/25 of a second.
    if samples * 25 > sample_rate as usize * 3 {
        debug!("{samples} samples exceed 120 ms at {sample_rate} Hz");
        return Err(FramingError::TooManySamples {
            samples,
            sample_rate,
        }
        .into());
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::parse::parse_packet;

    #[test]
    fn frame_counts() -> anyhow::Result<()> {
        assert_eq!(get_num_frames(&[0x00], 0, 1)?, 1);
        assert_eq!(get_num_frames(&[0x01], 0, 1)?, 2);
        assert_eq!(get_num_frames(&[0x02, 0], 0, 2)?, 2);
        assert_eq!(get_num_frames(&[0x03, 0x85], 0, 2)?, 5);

        assert_eq!(
            get_num_frames(&[0x03], 0, 1).unwrap_err(),
            FramingError::MissingFrameCount.into()
        );
        assert_eq!(
            get_num_frames(&[0x03, 0xC0], 0, 2).unwrap_err(),
            FramingError::ZeroFrames.into()
        );
        assert_eq!(
            get_num_frames(&[0x00], 1, 0).unwrap_err(),
            FramingError::EmptyPacket.into()
        );
        let err = get_num_frames(&[0x00], 0, 2).unwrap_err();
        assert!(err.is_bad_argument());

        Ok(())
    }

    #[test]
    fn header_fields() -> anyhow::Result<()> {
        let buffer = [0xFF, 0x7C, 0x60];

        assert_eq!(get_encoder_mode(&buffer, 0)?, Mode::CeltOnly);
        assert_eq!(get_bandwidth(&buffer, 0)?, Bandwidth::Fullband);
        assert_eq!(get_num_encoded_channels(&buffer, 0)?, 2);

        assert_eq!(get_encoder_mode(&buffer, 1)?, Mode::Hybrid);
        assert_eq!(get_bandwidth(&buffer, 1)?, Bandwidth::Fullband);

        assert_eq!(get_encoder_mode(&buffer, 2)?, Mode::Hybrid);
        assert_eq!(get_bandwidth(&buffer, 2)?, Bandwidth::SuperWideband);
        assert_eq!(get_num_encoded_channels(&buffer, 2)?, 1);

        assert!(get_encoder_mode(&buffer, 3).unwrap_err().is_bad_argument());

        Ok(())
    }

    #[test]
    fn sample_rates() -> anyhow::Result<()> {
        // SILK 60 ms.
        let buffer = [0x18];
        for (rate, samples) in [
            (8000, 480),
            (12000, 720),
            (16000, 960),
            (24000, 1440),
            (48000, 2880),
        ] {
            assert_eq!(get_num_samples_per_frame(&buffer, 0, rate)?, samples);
        }

        for rate in [0, 44100, 22050] {
            assert_eq!(
                get_num_samples_per_frame(&buffer, 0, rate).unwrap_err(),
                ArgumentError::InvalidSampleRate(rate).into()
            );
        }

        Ok(())
    }

    #[test]
    fn sample_totals() -> anyhow::Result<()> {
        // Two 60 ms SILK frames are exactly 120 ms.
        assert_eq!(get_num_samples(&[0x19], 0, 1, 48000)?, 5760);
        assert_eq!(get_num_samples(&[0x19], 0, 1, 8000)?, 960);

        // Three are too many.
        let err = get_num_samples(&[0x1B, 0x03], 0, 2, 48000).unwrap_err();
        assert_eq!(
            err,
            FramingError::TooManySamples {
                samples: 8640,
                sample_rate: 48000
            }
            .into()
        );

        Ok(())
    }

    #[test]
    fn queries_agree_with_parse() -> anyhow::Result<()> {
        let packets: [&[u8]; 5] = [
            &[0x00, 0x01, 0x02],
            &[0x4D, 0x01, 0x02],
            &[0x96, 0x01, 0xAA, 0xBB],
            &[0xFB, 0x04],
            &[
                0x03, 0xC3, 0x02, 0x01, 0x00, 0xA0, 0xB0, 0xB1, 0xB2, 0x00, 0x00,
            ],
        ];

        for data in packets {
            let packet = parse_packet(data, 0, data.len())?;
            let toc = packet.toc();

            assert_eq!(get_num_frames(data, 0, data.len())?, packet.frame_count());
            assert_eq!(get_encoder_mode(data, 0)?, toc.mode());
            assert_eq!(get_bandwidth(data, 0)?, toc.bandwidth());
            assert_eq!(get_num_encoded_channels(data, 0)?, toc.channels());

            for rate in [8000, 16000, 48000] {
                assert_eq!(
                    get_num_samples(data, 0, data.len(), rate)?,
                    packet.layout().total_samples(rate)
                );
            }
        }

        Ok(())
    }
}
