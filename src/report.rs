use serde::Serialize;

use opuspkt::structs::packet::ParsedPacket;

use crate::input::RawPacket;
use crate::timestamp::time_str;

#[derive(Debug, Clone, Serialize)]
pub struct PacketReport {
    pub index: usize,
    pub offset: usize,
    pub length: usize,
    pub toc: u8,
    pub config: u8,
    pub mode: String,
    pub bandwidth: String,
    pub channels: usize,
    pub frame_count_code: u8,
    pub cbr: bool,
    pub frame_sizes: Vec<usize>,
    pub payload_offset: usize,
    pub padding: usize,
    pub samples: usize,
    pub frame_duration_us: u32,
}

impl PacketReport {
    pub fn new(index: usize, offset: usize, packet: &ParsedPacket, sample_rate: u32) -> Self {
        let toc = packet.toc();
        let layout = packet.layout();

        Self {
            index,
            offset,
            length: packet.packet_len(),
            toc: toc.byte(),
            config: toc.config(),
            mode: toc.mode().to_string(),
            bandwidth: toc.bandwidth().to_string(),
            channels: toc.channels(),
            frame_count_code: toc.frame_count_code() as u8,
            cbr: layout.is_cbr(),
            frame_sizes: layout.frame_sizes().to_vec(),
            payload_offset: packet.payload_offset(),
            padding: packet.padding(),
            samples: layout.total_samples(sample_rate),
            frame_duration_us: toc.frame_duration_us(),
        }
    }

    pub fn display(&self) {
        println!(
            "Packet {} at byte {} ({} bytes)",
            self.index, self.offset, self.length
        );
        println!(
            "  TOC                       0x{:02X} (config {}, code {})",
            self.toc, self.config, self.frame_count_code
        );
        println!("  Mode                      {}", self.mode);
        println!("  Bandwidth                 {}", self.bandwidth);
        println!("  Channels                  {}", self.channels);
        println!(
            "  Frame duration            {}.{} ms",
            self.frame_duration_us / 1000,
            self.frame_duration_us % 1000 / 100
        );
        println!(
            "  Frames                    {} {} {:?}",
            self.frame_sizes.len(),
            if self.cbr { "CBR" } else { "VBR" },
            self.frame_sizes
        );
        println!("  Payload offset            {}", self.payload_offset);
        println!("  Padding                   {} bytes", self.padding);
        println!("  Samples                   {}", self.samples);
        println!();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidPacketReport {
    pub index: usize,
    pub offset: usize,
    pub length: usize,
    pub error: String,
}

impl InvalidPacketReport {
    pub fn new(raw: &RawPacket, error: impl ToString) -> Self {
        Self {
            index: raw.index,
            offset: raw.offset,
            length: raw.data.len(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PacketEntry {
    Valid(PacketReport),
    Invalid(InvalidPacketReport),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamSummary {
    pub packets: usize,
    pub invalid: usize,
    pub bytes: usize,
    pub samples: u64,
    pub sample_rate: u32,
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_bitrate_kbps: Option<f64>,
}

impl StreamSummary {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    pub fn add_valid(&mut self, report: &PacketReport) {
        self.packets += 1;
        self.bytes += report.length;
        self.samples += report.samples as u64;
    }

    pub fn add_invalid(&mut self, report: &InvalidPacketReport) {
        self.packets += 1;
        self.invalid += 1;
        self.bytes += report.length;
    }

    /// Fills in the derived fields once every packet is counted.
    pub fn finish(&mut self) {
        self.duration = time_str(self.samples, self.sample_rate);

        self.average_bitrate_kbps = (self.samples > 0).then(|| {
            let seconds = self.samples as f64 / f64::from(self.sample_rate);
            self.bytes as f64 * 8.0 / (seconds * 1000.0)
        });
    }

    pub fn display(&self) {
        println!("Analysis Summary");
        println!("  Packets processed         {}", self.packets);
        println!("  Invalid packets           {}", self.invalid);
        println!("  Size                      {} bytes", self.bytes);
        println!(
            "  Duration                  {} ({} samples at {} Hz)",
            self.duration, self.samples, self.sample_rate
        );
        if let Some(kbps) = self.average_bitrate_kbps {
            println!("  Average data rate         {kbps:.1} kbps");
        }
        println!();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamReport {
    pub packets: Vec<PacketEntry>,
    pub summary: StreamSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultistreamReport {
    pub index: usize,
    pub offset: usize,
    pub length: usize,
    pub streams: Vec<PacketReport>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use opuspkt::process::{EXAMPLE_PACKET, parse::parse_packet};

    fn example() -> anyhow::Result<PacketReport> {
        let raw = RawPacket {
            index: 2,
            offset: 40,
            final_range: 0,
            data: EXAMPLE_PACKET.to_vec(),
        };
        let packet = parse_packet(&raw.data, 0, raw.data.len())?;

        Ok(PacketReport::new(raw.index, raw.offset, &packet, 48000))
    }

    #[test]
    fn packet_report_fields() -> anyhow::Result<()> {
        let report = example()?;

        assert_eq!(report.toc, 0xFF);
        assert_eq!(report.mode, "CELT-only");
        assert_eq!(report.bandwidth, "Fullband (20 kHz)");
        assert_eq!(report.channels, 2);
        assert_eq!(report.frame_sizes, [4, 2, 3]);
        assert!(!report.cbr);
        assert_eq!(report.payload_offset, 5);
        assert_eq!(report.padding, 2);
        assert_eq!(report.samples, 2880);
        assert_eq!(report.frame_duration_us, 20000);

        Ok(())
    }

    #[test]
    fn yaml_entries_are_tagged() -> anyhow::Result<()> {
        let report = example()?;

        let mut summary = StreamSummary::new(48000);
        summary.add_valid(&report);
        summary.finish();
        assert_eq!(summary.duration, "00:00:00.060");

        let yaml = serde_yaml_ng::to_string(&StreamReport {
            packets: vec![PacketEntry::Valid(report)],
            summary,
        })?;
        assert!(yaml.contains("status: valid"));
        assert!(yaml.contains("mode: CELT-only"));

        Ok(())
    }
}
