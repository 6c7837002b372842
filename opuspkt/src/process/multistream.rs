//! Multistream packets.
//!
//! A multistream packet carries one packet per elementary stream. All but the
//! last use self-delimited framing; the last one fills whatever is left.

use log::debug;

use crate::process::pack::PacketBuilder;
use crate::process::parse::Framer;
use crate::structs::packet::{Framing, ParsedPacket};
use crate::utils::errors::{ArgumentError, FramingError, PacketError};

/// Splits `data` into the packets of `streams` elementary streams.
pub fn split_multistream(data: &[u8], streams: usize) -> Result<Vec<ParsedPacket>, PacketError> {
    if streams == 0 {
        return Err(ArgumentError::NoStreams.into());
    }

    let self_delimited = Framer::new(Framing::SelfDelimited);
    let standard = Framer::new(Framing::Standard);

    let mut packets = Vec::with_capacity(streams);
    let mut offset = 0;

    for stream in 0..streams {
        let length = data.len() - offset;
        if length == 0 {
            debug!("multistream packet ended after {stream} of {streams} streams");
            return Err(FramingError::StreamsExhausted {
                parsed: stream,
                streams,
            }
            .into());
        }

        let framer = if stream + 1 < streams {
            &self_delimited
        } else {
            &standard
        };

        let packet = framer.parse(data, offset, length)?;
        offset += packet.packet_len();
        packets.push(packet);
    }

    Ok(packets)
}

/// Joins one packet builder per stream into a multistream packet.
pub fn join_multistream(streams: &[PacketBuilder]) -> Result<Vec<u8>, PacketError> {
    let Some((last, rest)) = streams.split_last() else {
        return Err(ArgumentError::NoStreams.into());
    };

    let mut out = Vec::new();
    for stream in rest {
        let stream = stream.clone().with_framing(Framing::SelfDelimited);
        stream.write(&mut out)?;
    }
    let last = last.clone().with_framing(Framing::Standard);
    last.write(&mut out)?;

    Ok(out)
}

#[test]
fn multistream_round_trip() -> anyhow::Result<()> {
    use crate::structs::toc::{FrameCountCode, Toc};

    let frame_sets: [&[&[u8]]; 3] = [&[&[1; 40]], &[&[2; 10], &[3; 12]], &[&[4; 5], &[5; 5]]];

    let mut builders = Vec::new();
    for (i, frames) in frame_sets.iter().enumerate() {
        let toc = Toc::new(1 + i as u8, i == 0, FrameCountCode::Single);
        let mut builder = PacketBuilder::new(toc);
        for frame in frames.iter() {
            builder.push_frame(frame)?;
        }
        builders.push(builder);
    }

    let data = join_multistream(&builders)?;
    let packets = split_multistream(&data, builders.len())?;

    assert_eq!(packets.len(), 3);
    for (i, (packet, frames)) in packets.iter().zip(frame_sets).enumerate() {
        assert_eq!(packet.toc().config(), 1 + i as u8);
        assert_eq!(packet.frame_count(), frames.len());
        for (split, frame) in packet.frames().iter().zip(frames.iter()) {
            assert_eq!(&split[..], *frame);
        }
    }

    let total = packets.iter().map(ParsedPacket::packet_len).sum::<usize>();
    assert_eq!(total, data.len());

    Ok(())
}

#[test]
fn multistream_errors() -> anyhow::Result<()> {
    assert_eq!(
        split_multistream(&[0x00], 0).unwrap_err(),
        ArgumentError::NoStreams.into()
    );

    // One self-delimited packet consuming everything, but two streams expected.
    let data = [0x08, 0x01, 0xAA];
    assert_eq!(
        split_multistream(&data, 2).unwrap_err(),
        FramingError::StreamsExhausted {
            parsed: 1,
            streams: 2
        }
        .into()
    );

    // A single stream is just a standard packet.
    let packets = split_multistream(&data, 1)?;
    assert_eq!(packets[0].frames()[0].len(), 2);

    Ok(())
}
