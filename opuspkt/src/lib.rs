#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Framing layer of Opus packets according to RFC 6716, section 3.
//!
//! ### Packet Organization
//!
//! **Header**: a TOC byte selecting mode, bandwidth, frame duration, channel
//! count and one of four frame count codes.
//! **Frame count codes**: one frame (0), two equal frames (1), two frames with
//! an explicit first size (2), or up to 48 frames behind a frame count byte (3).
//! **Padding**: code 3 packets may end with escape-coded filler.
//!
//! ### Framing Variants
//!
//! - Standard: the last frame fills the packet up to its declared length
//! - Self-delimited: the last frame carries its own size, so packets can be
//!   concatenated, as inside multistream packets
//!
//! ### Limits
//!
//! Frames hold at most 1275 bytes and a packet at most 120 ms of audio.
//!
//! ## Quick Start
//!
//! 1. Parse packets with [`process::parse::parse_packet`] or a
//!    [`process::parse::Framer`]
//! 2. Query header fields without parsing using [`process::query`]
//! 3. Build, pad or unpad packets with [`process::pack`]
//!
//! ```rust
//! use opuspkt::process::{EXAMPLE_PACKET, parse::parse_packet, query::get_num_samples};
//! use opuspkt::structs::toc::Mode;
//!
//! let packet = parse_packet(EXAMPLE_PACKET, 0, EXAMPLE_PACKET.len())?;
//!
//! assert_eq!(packet.toc().mode(), Mode::CeltOnly);
//! assert_eq!(packet.frame_count(), 3);
//! assert_eq!(packet.padding(), 2);
//!
//! for frame in packet.frames() {
//!     println!("frame of {} bytes", frame.len());
//! }
//!
//! let samples = get_num_samples(EXAMPLE_PACKET, 0, EXAMPLE_PACKET.len(), 48000)?;
//! assert_eq!(samples, 3 * 960);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Packet processing.
///
/// 1. **Parsing** ([`process::parse`]): Validates a packet and splits it into
///    frames.
///
/// 2. **Queries** ([`process::query`]): Header fields and sample counts
///    without a full parse.
///
/// 3. **Self-delimited streams** ([`process::extract`]): Walks concatenated
///    self-delimited packets.
///
/// 4. **Multistream** ([`process::multistream`]): Splits and joins multistream
///    packets.
///
/// 5. **Packing** ([`process::pack`]): Builds packets from frames.
pub mod process;

/// Data structures representing packet components.
///
/// - **TOC** ([`structs::toc`]): Mode, bandwidth, duration and channels
/// - **Packets** ([`structs::packet`]): Frame layouts and parsed packets
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bounded reading
/// - **Size fields** ([`utils::size`]): Frame size and padding length codecs
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
