/// Packet framing.
///
/// Provides the [`Framer`](parse::Framer) for validating a packet and splitting
/// it into [`ParsedPacket`](crate::structs::packet::ParsedPacket) or
/// [`PacketRef`](crate::structs::packet::PacketRef) frames.
pub mod parse;

/// Header-only packet queries that agree with a full parse.
pub mod query;

/// Iteration over concatenated self-delimited packets.
pub mod extract;

/// Splitting and joining multistream packets.
pub mod multistream;

/// Packet assembly, padding and unpadding.
///
/// Provides the [`PacketBuilder`](pack::PacketBuilder), the inverse of
/// [`parse`].
pub mod pack;

/// A 20 ms CELT fullband stereo packet holding three frames of 4, 2 and 3
/// bytes, followed by 2 bytes of padding.
pub const EXAMPLE_PACKET: &[u8] = &[
    0xFF, 0xC3, 0x02, 0x04, 0x02, 0x10, 0x11, 0x12, 0x13, 0x20, 0x21, 0x30, 0x31, 0x32, 0x00, 0x00,
];
