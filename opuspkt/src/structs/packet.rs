//! Parsed packet structures.
//!
//! [`FrameLayout`] is the validated plan produced by the framer: where every
//! frame starts and how long it is. [`ParsedPacket`] owns copies of the frame
//! payloads, [`PacketRef`] borrows them from the caller's buffer.

use std::ops::Range;
use std::sync::Arc;

use crate::structs::toc::{FrameCountCode, Toc};

/// Largest number of frames a single packet can announce.
pub const MAX_FRAMES: usize = 48;

/// Longest audio duration a packet may carry, in samples at 48 kHz (120 ms).
pub const MAX_PACKET_SAMPLES: usize = 5760;

/// Packet framing variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Framing {
    /// The last frame fills the packet up to its externally known length.
    #[default]
    Standard,
    /// The last frame is size-prefixed too, so packets can be concatenated
    /// without an outer length field.
    SelfDelimited,
}

impl Framing {
    pub const fn is_self_delimited(self) -> bool {
        matches!(self, Framing::SelfDelimited)
    }
}

/// Validated frame layout of one packet.
///
/// All offsets are relative to the first byte of the packet (the TOC byte).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLayout {
    pub toc: Toc,
    pub framing: Framing,
    pub(crate) cbr: bool,
    pub(crate) sizes: [usize; MAX_FRAMES],
    pub(crate) count: usize,
    /// Filler bytes after the last frame.
    pub padding: usize,
    /// Start of the first frame: TOC, frame count byte, padding length field
    /// and every size field come before it.
    pub payload_offset: usize,
    /// Bytes the packet occupies, padding included.
    pub packet_len: usize,
}

impl FrameLayout {
    pub fn frame_count(&self) -> usize {
        self.count
    }

    pub fn frame_sizes(&self) -> &[usize] {
        &self.sizes[..self.count]
    }

    /// True when every frame has the same size by construction (code 1, or
    /// code 3 with the VBR bit clear).
    pub fn is_cbr(&self) -> bool {
        self.cbr
    }

    pub fn frame_count_code(&self) -> FrameCountCode {
        self.toc.frame_count_code()
    }

    /// Sum of all frame payload sizes.
    pub fn payload_len(&self) -> usize {
        self.frame_sizes().iter().sum()
    }

    /// Byte ranges of the frames within the packet.
    pub fn frame_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let mut start = self.payload_offset;

        self.frame_sizes().iter().map(move |&size| {
            let range = start..start + size;
            start += size;
            range
        })
    }

    /// Samples the whole packet decodes to at `sample_rate`.
    pub fn total_samples(&self, sample_rate: u32) -> usize {
        self.count * self.toc.samples_per_frame(sample_rate)
    }
}

/// A successfully parsed packet owning copies of its frames.
///
/// The frames do not alias the buffer the packet was parsed from, so the
/// caller may reuse that buffer as soon as parsing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPacket {
    layout: FrameLayout,
    frames: Vec<Arc<[u8]>>,
}

impl ParsedPacket {
    pub(crate) fn new(layout: FrameLayout, frames: Vec<Arc<[u8]>>) -> Self {
        debug_assert_eq!(layout.frame_count(), frames.len());
        Self { layout, frames }
    }

    pub fn toc(&self) -> Toc {
        self.layout.toc
    }

    pub fn toc_byte(&self) -> u8 {
        self.layout.toc.byte()
    }

    pub fn frames(&self) -> &[Arc<[u8]>] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn payload_offset(&self) -> usize {
        self.layout.payload_offset
    }

    pub fn padding(&self) -> usize {
        self.layout.padding
    }

    pub fn packet_len(&self) -> usize {
        self.layout.packet_len
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn into_frames(self) -> Vec<Arc<[u8]>> {
        self.frames
    }
}

/// A successfully parsed packet borrowing its frames from the source buffer.
///
/// Same validation as [`ParsedPacket`] without the per-frame copies; the frames
/// stay valid only as long as the borrowed buffer does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketRef<'a> {
    layout: FrameLayout,
    data: &'a [u8],
}

impl<'a> PacketRef<'a> {
    /// `data` starts at the TOC byte and spans at least `layout.packet_len`.
    pub(crate) fn new(layout: FrameLayout, data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= layout.packet_len);
        Self { layout, data }
    }

    pub fn toc(&self) -> Toc {
        self.layout.toc
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn frame_count(&self) -> usize {
        self.layout.frame_count()
    }

    pub fn frame(&self, index: usize) -> Option<&'a [u8]> {
        self.layout
            .frame_ranges()
            .nth(index)
            .and_then(|range| self.data.get(range))
    }

    pub fn frames(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let data = self.data;
        self.layout
            .frame_ranges()
            .filter_map(move |range| data.get(range))
    }

    /// The whole packet, padding included.
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.data[..self.layout.packet_len]
    }

    /// Copies the frames out into an owned packet.
    pub fn to_owned_packet(&self) -> ParsedPacket {
        let frames = self.frames().map(Arc::from).collect();
        ParsedPacket::new(self.layout.clone(), frames)
    }
}

#[test]
fn frame_ranges_walk_forward() {
    let mut sizes = [0; MAX_FRAMES];
    sizes[..3].copy_from_slice(&[2, 0, 5]);

    let layout = FrameLayout {
        toc: Toc::from(0x83),
        framing: Framing::Standard,
        cbr: false,
        sizes,
        count: 3,
        padding: 4,
        payload_offset: 4,
        packet_len: 15,
    };

    let ranges = layout.frame_ranges().collect::<Vec<_>>();
    assert_eq!(ranges, [4..6, 6..6, 6..11]);
    assert_eq!(layout.payload_len(), 7);
    assert_eq!(layout.total_samples(48000), 3 * 480);
}
