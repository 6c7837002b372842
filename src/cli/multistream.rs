use anyhow::{Result, bail};
use indicatif::MultiProgress;
use opuspkt::process::multistream::split_multistream;

use super::command::{Cli, Container, MultistreamArgs, ReportFormat};
use super::progress::{create_spinner, suspend};
use crate::input::for_each_packet;
use crate::report::{MultistreamReport, PacketReport};

pub fn cmd_multistream(
    args: &MultistreamArgs,
    cli: &Cli,
    multi: Option<&MultiProgress>,
) -> Result<()> {
    if args.container == Container::SelfDelimited {
        bail!("Multistream packets need a length-prefixed or raw container");
    }

    log::info!(
        "Splitting {}-stream packets: {}",
        args.streams,
        args.input.display()
    );

    let pb = multi
        .map(|multi| create_spinner(multi, "Splitting packets..."))
        .transpose()?;

    let mut reports = Vec::new();
    let mut invalid = 0;

    for_each_packet(&args.input, args.container, cli.strict, |raw| {
        match split_multistream(&raw.data, args.streams) {
            Ok(packets) => {
                let mut offset = 0;
                let streams = packets
                    .iter()
                    .enumerate()
                    .map(|(stream, packet)| {
                        let report = PacketReport::new(stream, offset, packet, 48000);
                        offset += packet.packet_len();
                        report
                    })
                    .collect();

                let report = MultistreamReport {
                    index: raw.index,
                    offset: raw.offset,
                    length: raw.data.len(),
                    streams,
                };

                if args.format == ReportFormat::Plain {
                    suspend(pb.as_ref(), || display_multistream(&report));
                } else {
                    reports.push(report);
                }
            }
            Err(e) if e.is_bad_argument() => return Err(e.into()),
            Err(e) => {
                if cli.strict {
                    return Err(e.into());
                }
                log::warn!("Packet {} at byte {}: {e}", raw.index, raw.offset);
                invalid += 1;
            }
        }

        if let Some(pb) = &pb {
            pb.inc(1);
        }

        Ok(())
    })?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    match args.format {
        ReportFormat::Plain => {
            if invalid > 0 {
                println!("{invalid} packets could not be split");
            }
        }
        ReportFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&reports)?),
    }

    Ok(())
}

fn display_multistream(report: &MultistreamReport) {
    println!(
        "Multistream packet {} at byte {} ({} bytes)",
        report.index, report.offset, report.length
    );

    for stream in &report.streams {
        println!(
            "  Stream {:<3}  {:>5} bytes  {:<9} {:<18} {}ch  frames {:?}",
            stream.index,
            stream.length,
            stream.mode,
            stream.bandwidth,
            stream.channels,
            stream.frame_sizes
        );
    }
    println!();
}
