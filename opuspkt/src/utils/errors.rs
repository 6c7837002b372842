#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Offset {offset} is outside the buffer of {buffer_len} bytes")]
    OffsetOutOfRange { offset: usize, buffer_len: usize },

    #[error(
        "Packet of {length} bytes at offset {offset} overruns the buffer of {buffer_len} bytes"
    )]
    LengthOutOfRange {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("Sampling rate must be a positive multiple of 400 Hz. Got {0}")]
    InvalidSampleRate(u32),

    #[error("Frame size {0} cannot be coded (maximum is 1275)")]
    SizeOutOfRange(usize),

    #[error("Output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("Padding must add at least one byte")]
    EmptyPadding,

    #[error("Packet has no frames to write")]
    NoFrames,

    #[error("A multistream packet needs at least one stream")]
    NoStreams,

    #[error(
        "Requested packet length {requested} is shorter than the unpadded packet ({minimum})"
    )]
    PaddedLengthTooShort { requested: usize, minimum: usize },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("Packet is empty")]
    EmptyPacket,

    #[error("Code 1 packet must carry an even payload. Read {0} bytes")]
    OddCbrPayload(usize),

    #[error("Frame size field is truncated: {remaining} bytes remain")]
    TruncatedSize { remaining: usize },

    #[error("Frame size {size} exceeds the {remaining} bytes remaining")]
    FrameSizeOverflow { size: usize, remaining: usize },

    #[error("Code 3 packet is missing its frame count byte")]
    MissingFrameCount,

    #[error("Code 3 packet must contain at least one frame")]
    ZeroFrames,

    #[error("{frames} frames of {samples_per_frame} samples exceed 120 ms at 48 kHz")]
    DurationExceeded {
        frames: usize,
        samples_per_frame: usize,
    },

    #[error("Padding length exceeds the packet")]
    PaddingOverflow,

    #[error("CBR payload of {len} bytes is not a multiple of {frames} frames")]
    CbrRemainder { len: usize, frames: usize },

    #[error("Explicit frame sizes overrun the packet, leaving no room for the last frame")]
    LastFrameUnderflow,

    #[error("Frame size must be <= 1275 bytes. Got {0}")]
    FrameTooLarge(usize),

    #[error("Self-delimited size {size} does not fit in the {available} bytes left")]
    SelfDelimitedOverflow { size: usize, available: usize },

    #[error("Packet data ended before the declared layout")]
    Truncated,

    #[error("{samples} samples exceed 120 ms at {sample_rate} Hz")]
    TooManySamples { samples: usize, sample_rate: u32 },

    #[error("TOC {found:#04X} does not match the packet configuration {expected:#04X}")]
    TocMismatch { expected: u8, found: u8 },

    #[error("A packet holds at most 48 frames")]
    TooManyFrames,

    #[error("Multistream packet ended after {parsed} of {streams} streams")]
    StreamsExhausted { parsed: usize, streams: usize },
}

/// Failure of any packet operation.
///
/// Separates caller contract violations from malformed bitstream content. A
/// caller that receives [`PacketError::InvalidPacket`] should drop the packet.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Bad argument: {0}")]
    BadArgument(#[from] ArgumentError),

    #[error("Invalid packet: {0}")]
    InvalidPacket(#[from] FramingError),
}

impl PacketError {
    pub fn is_bad_argument(&self) -> bool {
        matches!(self, PacketError::BadArgument(_))
    }

    pub fn is_invalid_packet(&self) -> bool {
        matches!(self, PacketError::InvalidPacket(_))
    }
}

#[test]
fn error_classification() {
    let err: PacketError = FramingError::ZeroFrames.into();
    assert!(err.is_invalid_packet());
    assert!(!err.is_bad_argument());
    assert_eq!(
        err.to_string(),
        "Invalid packet: Code 3 packet must contain at least one frame"
    );

    let err: PacketError = ArgumentError::InvalidSampleRate(44100).into();
    assert!(err.is_bad_argument());
    assert_eq!(
        err.to_string(),
        "Bad argument: Sampling rate must be a positive multiple of 400 Hz. Got 44100"
    );
}
