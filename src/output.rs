use std::io::Write;

use anyhow::{Result, bail};

use crate::cli::command::Container;

/// Writes packets in one of the supported containers.
///
/// Self-delimited output expects packets that were built self-delimited;
/// the writer only concatenates them.
pub struct PacketWriter<W: Write> {
    out: W,
    container: Container,
    packets: usize,
    bytes: usize,
}

impl<W: Write> PacketWriter<W> {
    pub fn new(out: W, container: Container) -> Self {
        Self {
            out,
            container,
            packets: 0,
            bytes: 0,
        }
    }

    pub fn write_packet(&mut self, packet: &[u8], final_range: u32) -> Result<()> {
        match self.container {
            Container::Raw if self.packets > 0 => {
                bail!("Raw output holds a single packet; choose another output container")
            }
            Container::Raw | Container::SelfDelimited => {}
            Container::LengthPrefixed => {
                let len = u32::try_from(packet.len())?;
                self.out.write_all(&len.to_be_bytes())?;
                self.out.write_all(&final_range.to_be_bytes())?;
                self.bytes += 8;
            }
        }

        self.out.write_all(packet)?;
        self.packets += 1;
        self.bytes += packet.len();

        Ok(())
    }

    pub fn packets(&self) -> usize {
        self.packets
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::LengthPrefixedSplitter;

    #[test]
    fn length_prefixed_round_trip() -> Result<()> {
        let mut writer = PacketWriter::new(Vec::new(), Container::LengthPrefixed);
        writer.write_packet(&[0x08, 1, 2, 3], 42)?;
        writer.write_packet(&[0x09], 0)?;
        assert_eq!(writer.bytes(), 8 + 4 + 8 + 1);

        let stream = writer.finish()?;
        let mut splitter = LengthPrefixedSplitter::default();
        splitter.push_bytes(&stream);

        let packets = splitter.collect::<Result<Vec<_>>>()?;
        assert_eq!(packets[0].data, [0x08, 1, 2, 3]);
        assert_eq!(packets[0].final_range, 42);
        assert_eq!(packets[1].data, [0x09]);

        Ok(())
    }

    #[test]
    fn raw_takes_one_packet() -> Result<()> {
        let mut writer = PacketWriter::new(Vec::new(), Container::Raw);
        writer.write_packet(&[0x08, 1], 0)?;
        assert!(writer.write_packet(&[0x08, 2], 0).is_err());
        assert_eq!(writer.packets(), 1);
        assert_eq!(writer.finish()?, [0x08, 1]);

        Ok(())
    }
}
