//! Raw pixel layouts negotiated with the codec engine.

use std::fmt;

/// Headerless raw layout piped between this crate and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawPixelFormat {
    /// Single 8-bit plane.
    Gray,
    /// Single plane of little-endian 16-bit samples holding 12 significant bits.
    Gray12Le,
    /// Three full-resolution 8-bit planes (Y, U, V).
    Yuv444p,
}

impl RawPixelFormat {
    /// Layout fed to the engine's stdin when encoding. The writer only
    /// produces 8-bit single-channel streams.
    pub const ENCODE: RawPixelFormat = RawPixelFormat::Gray;

    /// Picks the layout to request when decoding a stream whose probed
    /// pixel format is `probed`, e.g. "gray12le" or "gray12le(tv)".
    pub fn for_probed(probed: &str) -> Self {
        let base = probed
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if base.starts_with("gray12") {
            RawPixelFormat::Gray12Le
        } else if base == "gray" {
            RawPixelFormat::Gray
        } else {
            RawPixelFormat::Yuv444p
        }
    }

    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            RawPixelFormat::Gray => "gray",
            RawPixelFormat::Gray12Le => "gray12le",
            RawPixelFormat::Yuv444p => "yuv444p",
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            RawPixelFormat::Gray | RawPixelFormat::Yuv444p => 1,
            RawPixelFormat::Gray12Le => 2,
        }
    }

    pub fn planes(&self) -> usize {
        match self {
            RawPixelFormat::Gray | RawPixelFormat::Gray12Le => 1,
            RawPixelFormat::Yuv444p => 3,
        }
    }

    /// Bytes of one luma plane at the given size.
    pub fn plane_bytes(&self, height: usize, width: usize) -> usize {
        height * width * self.bytes_per_sample()
    }

    /// Bytes of one complete frame (all planes) at the given size.
    pub fn frame_bytes(&self, height: usize, width: usize) -> usize {
        self.plane_bytes(height, width) * self.planes()
    }
}

impl fmt::Display for RawPixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}
