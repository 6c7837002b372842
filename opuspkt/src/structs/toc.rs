//! Table-of-contents (TOC) byte.
//!
//! ```text
//!  0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+
//! | config  |s| c |
//! +-+-+-+-+-+-+-+-+
//! ```
//!
//! The 5-bit `config` selects the coding mode, the audio bandwidth and the
//! frame duration, `s` flags stereo, and `c` is the frame count code. Every
//! byte value is a valid TOC.

use std::fmt::{Display, Formatter};

/// Sampling rate all frame durations are expressed against.
pub const REFERENCE_SAMPLE_RATE: u32 = 48000;

/// Operating mode the frames of a packet were coded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Linear-prediction layer only, for speech up to wideband.
    SilkOnly,
    /// Linear-prediction layer below 8 kHz plus transform layer above.
    Hybrid,
    /// Transform layer only.
    CeltOnly,
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::SilkOnly => "SILK-only",
            Mode::Hybrid => "Hybrid",
            Mode::CeltOnly => "CELT-only",
        })
    }
}

/// Audio bandwidth of the coded signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bandwidth {
    Narrowband,
    Mediumband,
    Wideband,
    SuperWideband,
    Fullband,
}

impl Bandwidth {
    /// Audio passband upper edge in Hz.
    pub const fn cutoff_hz(self) -> u32 {
        match self {
            Bandwidth::Narrowband => 4000,
            Bandwidth::Mediumband => 6000,
            Bandwidth::Wideband => 8000,
            Bandwidth::SuperWideband => 12000,
            Bandwidth::Fullband => 20000,
        }
    }

    /// Effective sampling rate the bandwidth corresponds to.
    pub const fn sample_rate(self) -> u32 {
        match self {
            Bandwidth::Narrowband => 8000,
            Bandwidth::Mediumband => 12000,
            Bandwidth::Wideband => 16000,
            Bandwidth::SuperWideband => 24000,
            Bandwidth::Fullband => 48000,
        }
    }

    const fn from_index(index: u8) -> Self {
        match index {
            0 => Bandwidth::Narrowband,
            1 => Bandwidth::Mediumband,
            2 => Bandwidth::Wideband,
            3 => Bandwidth::SuperWideband,
            _ => Bandwidth::Fullband,
        }
    }
}

impl Display for Bandwidth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Bandwidth::Narrowband => "Narrowband",
            Bandwidth::Mediumband => "Mediumband",
            Bandwidth::Wideband => "Wideband",
            Bandwidth::SuperWideband => "Super-wideband",
            Bandwidth::Fullband => "Fullband",
        };

        write!(f, "{name} ({} kHz)", self.cutoff_hz() / 1000)
    }
}

/// How the frames of a packet are laid out after the TOC byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameCountCode {
    /// One frame.
    Single = 0,
    /// Two frames of equal size.
    TwoEqual = 1,
    /// Two frames, the first one size-prefixed.
    TwoVariable = 2,
    /// Any number of frames announced by a frame count byte.
    Arbitrary = 3,
}

impl From<u8> for FrameCountCode {
    fn from(value: u8) -> Self {
        match value & 0x3 {
            0 => FrameCountCode::Single,
            1 => FrameCountCode::TwoEqual,
            2 => FrameCountCode::TwoVariable,
            _ => FrameCountCode::Arbitrary,
        }
    }
}

/// Decoded TOC byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Toc(u8);

impl From<u8> for Toc {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<Toc> for u8 {
    fn from(toc: Toc) -> Self {
        toc.0
    }
}

impl Toc {
    /// Builds a TOC from its three fields. Out-of-range bits are masked off.
    pub const fn new(config: u8, stereo: bool, code: FrameCountCode) -> Self {
        Self(((config & 0x1F) << 3) | ((stereo as u8) << 2) | code as u8)
    }

    pub const fn byte(self) -> u8 {
        self.0
    }

    /// Configuration number (0-31).
    pub const fn config(self) -> u8 {
        self.0 >> 3
    }

    pub fn mode(self) -> Mode {
        if self.0 & 0x80 != 0 {
            Mode::CeltOnly
        } else if self.0 & 0x60 == 0x60 {
            Mode::Hybrid
        } else {
            Mode::SilkOnly
        }
    }

    pub fn bandwidth(self) -> Bandwidth {
        let index = (self.0 >> 5) & 0x3;

        match self.mode() {
            // CELT has no mediumband: index 0 is narrowband, 1..3 wideband and up.
            Mode::CeltOnly => match index {
                0 => Bandwidth::Narrowband,
                i => Bandwidth::from_index(i + 1),
            },
            Mode::Hybrid => {
                if self.0 & 0x10 != 0 {
                    Bandwidth::Fullband
                } else {
                    Bandwidth::SuperWideband
                }
            }
            Mode::SilkOnly => Bandwidth::from_index(index),
        }
    }

    pub const fn is_stereo(self) -> bool {
        self.0 & 0x4 != 0
    }

    pub const fn channels(self) -> usize {
        if self.is_stereo() { 2 } else { 1 }
    }

    pub fn frame_count_code(self) -> FrameCountCode {
        self.0.into()
    }

    /// Samples one frame of this packet decodes to at `sample_rate`.
    ///
    /// Exact for sample rates that are multiples of 400 Hz.
    pub fn samples_per_frame(self, sample_rate: u32) -> usize {
        let fs = sample_rate as usize;
        let size = ((self.0 >> 3) & 0x3) as usize;

        match self.mode() {
            Mode::CeltOnly => (fs << size) / 400,
            Mode::Hybrid => {
                if self.0 & 0x08 != 0 {
                    fs / 50
                } else {
                    fs / 100
                }
            }
            Mode::SilkOnly => {
                if size == 3 {
                    fs * 60 / 1000
                } else {
                    (fs << size) / 100
                }
            }
        }
    }

    /// Frame duration in microseconds.
    pub fn frame_duration_us(self) -> u32 {
        (self.samples_per_frame(REFERENCE_SAMPLE_RATE) as u32) * 1_000_000 / REFERENCE_SAMPLE_RATE
    }

    /// True when both TOCs describe the same configuration and channel count,
    /// which is what frames need to share a packet.
    pub const fn is_compatible(self, other: Toc) -> bool {
        self.0 & 0xFC == other.0 & 0xFC
    }

    /// Same configuration and channel count with a different frame count code.
    pub const fn with_code(self, code: FrameCountCode) -> Self {
        Self((self.0 & 0xFC) | code as u8)
    }
}

impl Display for Toc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let duration = self.frame_duration_us();

        write!(
            f,
            "config {} ({}, {}, {}.{} ms), {}, code {}",
            self.config(),
            self.mode(),
            self.bandwidth(),
            duration / 1000,
            (duration % 1000) / 100,
            if self.is_stereo() { "stereo" } else { "mono" },
            self.frame_count_code() as u8
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_toc(config: u8) -> Toc {
        Toc::new(config, false, FrameCountCode::Single)
    }

    #[test]
    fn modes_by_config() {
        for config in 0..32 {
            let expected = match config {
                0..=11 => Mode::SilkOnly,
                12..=15 => Mode::Hybrid,
                _ => Mode::CeltOnly,
            };
            assert_eq!(config_toc(config).mode(), expected, "config {config}");
        }
    }

    #[test]
    fn bandwidths_by_config() {
        use Bandwidth::*;

        #[rustfmt::skip]
        let expected = [
            Narrowband, Narrowband, Narrowband, Narrowband,
            Mediumband, Mediumband, Mediumband, Mediumband,
            Wideband, Wideband, Wideband, Wideband,
            SuperWideband, SuperWideband,
            Fullband, Fullband,
            Narrowband, Narrowband, Narrowband, Narrowband,
            Wideband, Wideband, Wideband, Wideband,
            SuperWideband, SuperWideband, SuperWideband, SuperWideband,
            Fullband, Fullband, Fullband, Fullband,
        ];

        for (config, bandwidth) in expected.iter().enumerate() {
            assert_eq!(config_toc(config as u8).bandwidth(), *bandwidth);
        }
    }

    #[test]
    fn frame_sizes_by_config() {
        let expected = [
            480, 960, 1920, 2880, 480, 960, 1920, 2880, 480, 960, 1920, 2880, 480, 960, 480, 960,
            120, 240, 480, 960, 120, 240, 480, 960, 120, 240, 480, 960, 120, 240, 480, 960,
        ];

        for (config, samples) in expected.iter().enumerate() {
            assert_eq!(config_toc(config as u8).samples_per_frame(48000), *samples);
        }

        assert_eq!(config_toc(3).samples_per_frame(8000), 480);
        assert_eq!(config_toc(16).samples_per_frame(16000), 40);
        assert_eq!(config_toc(16).frame_duration_us(), 2500);
        assert_eq!(config_toc(3).frame_duration_us(), 60000);
    }

    #[test]
    fn fields() {
        let toc = Toc::from(0b1111_1111);
        assert_eq!(toc.config(), 31);
        assert!(toc.is_stereo());
        assert_eq!(toc.channels(), 2);
        assert_eq!(toc.frame_count_code(), FrameCountCode::Arbitrary);

        let toc = Toc::new(12, false, FrameCountCode::TwoVariable);
        assert_eq!(toc.byte(), 0x62);
        assert_eq!(toc.channels(), 1);
        assert_eq!(toc.with_code(FrameCountCode::Single).byte(), 0x60);
        assert!(toc.is_compatible(Toc::from(0x63)));
        assert!(!toc.is_compatible(Toc::from(0x66)));
    }

    #[test]
    fn display() {
        let toc = Toc::new(17, true, FrameCountCode::TwoEqual);
        assert_eq!(
            toc.to_string(),
            "config 17 (CELT-only, Narrowband (4 kHz), 5.0 ms), stereo, code 1"
        );
        assert_eq!(
            Toc::new(16, false, FrameCountCode::Single).to_string(),
            "config 16 (CELT-only, Narrowband (4 kHz), 2.5 ms), mono, code 0"
        );
    }
}
