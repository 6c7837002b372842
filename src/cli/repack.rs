use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Result, bail};
use indicatif::MultiProgress;
use opuspkt::process::pack::PacketBuilder;
use opuspkt::process::parse::Framer;
use opuspkt::structs::packet::{Framing, ParsedPacket};

use super::command::{Cli, RepackArgs};
use super::progress::create_spinner;
use crate::input::for_each_packet;
use crate::output::PacketWriter;

pub fn cmd_repack(args: &RepackArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if args.merge == 0 {
        bail!("--merge must be at least 1");
    }

    let output_container = args.output_container.unwrap_or(args.container);
    let framer = Framer::new(args.container.framing());

    log::info!(
        "Repacking {} into {}",
        args.input.display(),
        args.output.display()
    );

    let pb = multi
        .map(|multi| create_spinner(multi, "Repacking packets..."))
        .transpose()?;

    let file = File::create(&args.output)?;
    let mut repacker = Repacker {
        writer: PacketWriter::new(BufWriter::new(file), output_container),
        framing: output_container.framing(),
        pad_to: args.pad_to,
        unpad: args.unpad,
        strict: cli.strict,
        merge: args.merge,
        pending: None,
        skipped: 0,
    };

    for_each_packet(&args.input, args.container, cli.strict, |raw| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }

        match framer.parse(&raw.data, 0, raw.data.len()) {
            Ok(packet) => repacker.push(packet, &raw.data, raw.final_range),
            Err(e) if cli.strict => Err(e.into()),
            Err(e) => {
                log::warn!("Dropping packet {} at byte {}: {e}", raw.index, raw.offset);
                repacker.skipped += 1;
                Ok(())
            }
        }
    })?;

    repacker.flush()?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let skipped = repacker.skipped;
    let writer = repacker.writer;
    log::info!(
        "Wrote {} packets ({} bytes), dropped {skipped}",
        writer.packets(),
        writer.bytes()
    );
    writer.finish()?;

    Ok(())
}

struct Pending {
    builder: PacketBuilder,
    /// Input bytes, kept while the packet can be written out unchanged.
    original: Option<Vec<u8>>,
    final_range: u32,
    merged: usize,
}

struct Repacker<W: Write> {
    writer: PacketWriter<W>,
    framing: Framing,
    pad_to: Option<usize>,
    unpad: bool,
    strict: bool,
    merge: usize,
    pending: Option<Pending>,
    skipped: usize,
}

impl<W: Write> Repacker<W> {
    fn push(&mut self, packet: ParsedPacket, data: &[u8], final_range: u32) -> Result<()> {
        if let Some(pending) = &mut self.pending {
            // Merged packets no longer match any single final range.
            if pending.merged < self.merge && pending.builder.push_packet(&packet).is_ok() {
                pending.merged += 1;
                pending.original = None;
                pending.final_range = 0;
                return Ok(());
            }
            self.flush()?;
        }

        let mut builder = PacketBuilder::new(packet.toc()).with_framing(self.framing);
        builder.push_packet(&packet)?;

        let unchanged = packet.layout().framing == self.framing;
        self.pending = Some(Pending {
            builder,
            original: unchanged.then(|| data.to_vec()),
            final_range,
            merged: 1,
        });

        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };

        let packet = match (self.pad_to, pending.original) {
            (Some(len), _) => match pending.builder.build_padded(len) {
                Ok(packet) => packet,
                Err(e) if self.strict => return Err(e.into()),
                Err(e) => {
                    log::warn!("{e}; writing the packet unpadded");
                    pending.builder.build()?
                }
            },
            (None, Some(original)) if !self.unpad => original,
            _ => pending.builder.build()?,
        };

        self.writer.write_packet(&packet, pending.final_range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::Container;
    use opuspkt::process::parse::parse_packet;
    use opuspkt::structs::toc::{FrameCountCode, Toc};

    fn repacker(framing: Framing, pad_to: Option<usize>, merge: usize) -> Repacker<Vec<u8>> {
        Repacker {
            writer: PacketWriter::new(Vec::new(), Container::SelfDelimited),
            framing,
            pad_to,
            unpad: false,
            strict: true,
            merge,
            pending: None,
            skipped: 0,
        }
    }

    fn packet(frames: &[&[u8]]) -> Result<Vec<u8>> {
        let mut builder = PacketBuilder::new(Toc::new(1, false, FrameCountCode::Single));
        for frame in frames {
            builder.push_frame(frame)?;
        }
        Ok(builder.build()?)
    }

    #[test]
    fn merges_and_pads() -> Result<()> {
        let mut repacker = repacker(Framing::Standard, Some(64), 2);

        for data in [packet(&[&[1; 5]])?, packet(&[&[2; 7]])?] {
            repacker.push(parse_packet(&data, 0, data.len())?, &data, 9)?;
        }
        repacker.flush()?;

        let out = repacker.writer.finish()?;
        assert_eq!(out.len(), 64);

        let merged = parse_packet(&out, 0, out.len())?;
        assert_eq!(merged.frame_count(), 2);
        assert_eq!(&merged.frames()[1][..], &[2; 7]);

        Ok(())
    }

    #[test]
    fn keeps_unchanged_packets() -> Result<()> {
        let mut data = packet(&[&[1; 5]])?;
        data = opuspkt::process::pack::pad(&data, 20)?;

        let mut repacker = repacker(Framing::Standard, None, 1);
        repacker.push(parse_packet(&data, 0, data.len())?, &data, 0)?;
        repacker.flush()?;

        assert_eq!(repacker.writer.finish()?, data);

        Ok(())
    }
}
