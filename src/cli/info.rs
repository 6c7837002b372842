use anyhow::Result;
use indicatif::MultiProgress;
use opuspkt::process::parse::Framer;
use opuspkt::process::query::check_sample_rate;

use super::command::{Cli, InfoArgs, ReportFormat};
use super::progress::{create_spinner, suspend};
use crate::input::for_each_packet;
use crate::report::{InvalidPacketReport, PacketEntry, PacketReport, StreamReport, StreamSummary};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing packet stream: {}", args.input.display());

    let sample_rate = check_sample_rate(args.sample_rate)?;
    let plain = args.format == ReportFormat::Plain;
    let framer = Framer::new(args.container.framing());

    let pb = multi
        .map(|multi| create_spinner(multi, "Analyzing packets..."))
        .transpose()?;

    let mut entries = Vec::new();
    let mut summary = StreamSummary::new(sample_rate);

    for_each_packet(&args.input, args.container, cli.strict, |raw| {
        let entry = match framer.parse(&raw.data, 0, raw.data.len()) {
            Ok(packet) => {
                let report = PacketReport::new(raw.index, raw.offset, &packet, sample_rate);
                summary.add_valid(&report);
                PacketEntry::Valid(report)
            }
            Err(e) => {
                if cli.strict {
                    return Err(e.into());
                }
                log::warn!("Packet {} at byte {}: {e}", raw.index, raw.offset);

                let report = InvalidPacketReport::new(&raw, e);
                summary.add_invalid(&report);
                PacketEntry::Invalid(report)
            }
        };

        if let Some(pb) = &pb {
            pb.inc(1);
        }

        if plain {
            if let PacketEntry::Valid(report) = &entry {
                suspend(pb.as_ref(), || report.display());
            }
        } else {
            entries.push(entry);
        }

        Ok(())
    })?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    summary.finish();

    match args.format {
        ReportFormat::Plain => summary.display(),
        ReportFormat::Yaml => {
            let report = StreamReport {
                packets: entries,
                summary,
            };
            print!("{}", serde_yaml_ng::to_string(&report)?);
        }
    }

    Ok(())
}
