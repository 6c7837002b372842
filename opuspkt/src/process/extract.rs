use log::{debug, trace};

use crate::process::parse::Framer;
use crate::structs::packet::{Framing, PacketRef};
use crate::utils::errors::PacketError;

/// Iterates over back-to-back self-delimited packets in one buffer.
///
/// Each packet's total length is known only after parsing it, so a malformed
/// packet leaves no way to find the next one. The iterator yields that error
/// once and then ends.
///
/// # Example
///
/// ```rust
/// use opuspkt::process::extract::SelfDelimitedPackets;
///
/// // Two self-delimited code 0 packets: one 2-byte frame, one empty frame.
/// let data = [0x08, 0x02, 0xAA, 0xBB, 0x08, 0x00];
///
/// let sizes = SelfDelimitedPackets::new(&data)
///     .map(|packet| packet.map(|p| p.layout().payload_len()))
///     .collect::<Result<Vec<_>, _>>()?;
/// assert_eq!(sizes, [2, 0]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct SelfDelimitedPackets<'a> {
    data: &'a [u8],
    position: usize,
    framer: Framer,
    failed: bool,
}

impl<'a> SelfDelimitedPackets<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            framer: Framer::new(Framing::SelfDelimited),
            failed: false,
        }
    }

    /// Offset of the next packet within the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }
}

impl<'a> Iterator for SelfDelimitedPackets<'a> {
    type Item = Result<PacketRef<'a>, PacketError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.position >= self.data.len() {
            return None;
        }

        let length = self.data.len() - self.position;
        match self.framer.parse_ref(self.data, self.position, length) {
            Ok(packet) => {
                trace!(
                    "self-delimited packet at {}: {} bytes",
                    self.position,
                    packet.layout().packet_len
                );
                self.position += packet.layout().packet_len;
                Some(Ok(packet))
            }
            Err(err) => {
                debug!("lost packet sync at {}: {err}", self.position);
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::pack::PacketBuilder;
    use crate::structs::toc::{FrameCountCode, Toc};

    #[test]
    fn walks_concatenated_packets() -> anyhow::Result<()> {
        let toc = Toc::new(20, false, FrameCountCode::Single);
        let frame_sets: [&[&[u8]]; 4] = [
            &[&[1, 2, 3]],
            &[&[4; 300], &[5; 300]],
            &[&[6], &[7; 2], &[8; 3]],
            &[&[]],
        ];

        let mut data = Vec::new();
        let mut lengths = Vec::new();
        for (i, frames) in frame_sets.iter().enumerate() {
            let mut builder = PacketBuilder::new(toc).with_framing(Framing::SelfDelimited);
            for frame in frames.iter() {
                builder.push_frame(frame)?;
            }
            lengths.push(builder.with_padding(i).write(&mut data)?);
        }

        let mut packets = SelfDelimitedPackets::new(&data);
        let mut consumed = 0;
        for (frames, length) in frame_sets.iter().zip(&lengths) {
            let packet = packets.next().unwrap()?;
            assert_eq!(packet.frames().collect::<Vec<_>>(), frames.to_vec());
            assert_eq!(packet.as_bytes().len(), *length);
            consumed += length;
            assert_eq!(packets.position(), consumed);
        }

        assert!(packets.next().is_none());
        assert_eq!(consumed, data.len());
        assert!(packets.remaining().is_empty());

        Ok(())
    }

    #[test]
    fn stops_after_error() {
        // Second packet claims a 9-byte frame with only one byte left.
        let data = [0x08, 0x01, 0xAA, 0x08, 0x09, 0xBB];

        let mut packets = SelfDelimitedPackets::new(&data);
        assert!(packets.next().unwrap().is_ok());
        assert!(packets.next().unwrap().unwrap_err().is_invalid_packet());
        assert!(packets.next().is_none());
        assert_eq!(packets.position(), 3);
        assert_eq!(packets.remaining(), &data[3..]);
    }
}
