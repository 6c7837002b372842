use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Result, bail};
use opuspkt::process::extract::SelfDelimitedPackets;

use crate::cli::command::Container;

/// Length-prefixed records above this size mean the input is not
/// length-prefixed at all.
const MAX_RECORD_LEN: usize = 1 << 20;

const RECORD_HEADER_LEN: usize = 8;

/// Unified input reader that handles both file and pipe input with buffered reading
pub struct InputReader {
    reader: Box<dyn Read>,
}

impl InputReader {
    /// Use "-" for stdin
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let reader: Box<dyn Read> = if input_path.as_ref().as_os_str() == "-" {
            Box::new(io::stdin().lock())
        } else {
            Box::new(BufReader::new(File::open(input_path)?))
        };

        Ok(Self { reader })
    }

    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Feeds the input to `callback` in chunks until EOF or until the callback
    /// returns `Ok(false)`.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size];

        loop {
            let bytes_read = self.reader.read(&mut buffer)?;
            if bytes_read == 0 || !callback(&buffer[..bytes_read])? {
                break;
            }
        }

        Ok(())
    }
}

/// One packet cut out of the input container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub index: usize,
    /// Byte offset of the packet within the input.
    pub offset: usize,
    /// Encoder final range, when the container records it.
    pub final_range: u32,
    pub data: Vec<u8>,
}

/// Cuts length-prefixed records out of a byte stream fed in arbitrary chunks.
#[derive(Debug, Default)]
pub struct LengthPrefixedSplitter {
    buffer: Vec<u8>,
    /// Start of the first unread record in `buffer`.
    position: usize,
    /// Input offset of the byte at `position`.
    offset: usize,
    index: usize,
    failed: bool,
}

impl LengthPrefixedSplitter {
    pub fn push_bytes(&mut self, data: &[u8]) {
        if self.failed {
            return;
        }

        self.buffer.drain(..self.position);
        self.position = 0;
        self.buffer.extend_from_slice(data);
    }

    /// Bytes buffered that do not yet form a complete record.
    pub fn pending(&self) -> usize {
        self.buffer.len() - self.position
    }
}

impl Iterator for LengthPrefixedSplitter {
    type Item = Result<RawPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = &self.buffer[self.position..];
        if self.failed || record.len() < RECORD_HEADER_LEN {
            return None;
        }

        let word = |at: usize| {
            u32::from_be_bytes([record[at], record[at + 1], record[at + 2], record[at + 3]])
        };
        let len = word(0) as usize;
        let final_range = word(4);

        if len > MAX_RECORD_LEN {
            self.failed = true;
            self.buffer.clear();
            self.position = 0;
            return Some(Err(anyhow::anyhow!(
                "Record at byte {} declares {len} bytes; input is not length-prefixed",
                self.offset
            )));
        }

        let record_len = RECORD_HEADER_LEN + len;
        if record.len() < record_len {
            return None;
        }

        let packet = RawPacket {
            index: self.index,
            offset: self.offset + RECORD_HEADER_LEN,
            final_range,
            data: record[RECORD_HEADER_LEN..record_len].to_vec(),
        };

        self.position += record_len;
        self.offset += record_len;
        self.index += 1;

        Some(Ok(packet))
    }
}

/// Reads `input` and hands every packet of the container to `callback`.
///
/// Self-delimited input cannot be resynchronized after a malformed packet, so
/// the rest of it is skipped with a warning, or rejected when `strict`.
pub fn for_each_packet<F>(
    input: &Path,
    container: Container,
    strict: bool,
    mut callback: F,
) -> Result<()>
where
    F: FnMut(RawPacket) -> Result<()>,
{
    let mut reader = InputReader::new(input)?;

    match container {
        Container::Raw => callback(RawPacket {
            index: 0,
            offset: 0,
            final_range: 0,
            data: reader.read_all()?,
        }),
        Container::LengthPrefixed => {
            let mut splitter = LengthPrefixedSplitter::default();

            reader.process_chunks(64 * 1024, |chunk| {
                splitter.push_bytes(chunk);
                for packet in splitter.by_ref() {
                    callback(packet?)?;
                }
                Ok(true)
            })?;

            let pending = splitter.pending();
            if pending > 0 {
                if strict {
                    bail!("{pending} trailing bytes do not form a complete record");
                }
                log::warn!("Ignoring {pending} trailing bytes");
            }

            Ok(())
        }
        Container::SelfDelimited => {
            let data = reader.read_all()?;
            let mut packets = SelfDelimitedPackets::new(&data);

            for index in 0.. {
                let offset = packets.position();
                let Some(result) = packets.next() else {
                    break;
                };

                match result {
                    Ok(packet) => callback(RawPacket {
                        index,
                        offset,
                        final_range: 0,
                        data: packet.as_bytes().to_vec(),
                    })?,
                    Err(e) if strict => return Err(e.into()),
                    Err(e) => log::warn!(
                        "Packet {index} at byte {offset}: {e}; skipping the remaining {} bytes",
                        data.len() - offset
                    ),
                }
            }

            Ok(())
        }
    }
}
