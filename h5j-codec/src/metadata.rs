//! Stream metadata of a compressed channel (similar to ffprobe).

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CodecError, Result};

/// First video stream of a probed channel file.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    /// Stream index.
    pub index: usize,
    /// Codec name, e.g. "hevc"
    pub codec_name: String,
    pub width: u32,
    pub height: u32,
    /// Pixel format as reported by the engine, e.g. "gray12le"
    pub pix_fmt: String,
    /// Frame rate, e.g. "25/1"
    pub rate: String,
    /// Frame count; None if the container does not record it.
    pub nb_frames: Option<u64>,
}

impl fmt::Display for StreamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[STREAM]")?;
        writeln!(f, "index={}", self.index)?;
        writeln!(f, "codec_name={}", self.codec_name)?;
        writeln!(f, "width={}", self.width)?;
        writeln!(f, "height={}", self.height)?;
        writeln!(f, "pix_fmt={}", self.pix_fmt)?;
        writeln!(f, "rate={}", self.rate)?;
        match self.nb_frames {
            Some(n) => writeln!(f, "nb_frames={}", n)?,
            None => writeln!(f, "nb_frames=N/A")?,
        }
        writeln!(f, "[/STREAM]")
    }
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    codec_name: String,
    width: Option<u32>,
    height: Option<u32>,
    pix_fmt: Option<String>,
    #[serde(default)]
    r_frame_rate: String,
    // ffprobe reports counts as strings
    nb_frames: Option<String>,
}

/// Parses `ffprobe -of json -show_entries stream=...` output.
///
/// # Example
///
/// ```ignore
/// let info = parse_probe_json(Path::new("channel.mp4"), &stdout)?;
/// println!("{}", info);
/// ```
pub fn parse_probe_json(path: &Path, json: &[u8]) -> Result<StreamInfo> {
    let probe_error = |reason: String| CodecError::Probe {
        path: path.to_path_buf(),
        reason,
    };
    let output: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| probe_error(e.to_string()))?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| probe_error("no video stream".to_string()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(probe_error("missing frame size".to_string())),
    };
    let pix_fmt = stream
        .pix_fmt
        .ok_or_else(|| probe_error("missing pixel format".to_string()))?;

    Ok(StreamInfo {
        index: stream.index,
        codec_name: stream.codec_name,
        width,
        height,
        pix_fmt,
        rate: stream.r_frame_rate,
        nb_frames: stream.nb_frames.and_then(|n| n.parse().ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_json() {
        let json = br#"{
            "programs": [],
            "streams": [
                {
                    "index": 0,
                    "codec_name": "hevc",
                    "width": 512,
                    "height": 256,
                    "pix_fmt": "gray12le",
                    "r_frame_rate": "25/1",
                    "nb_frames": "40"
                }
            ]
        }"#;
        let info = parse_probe_json(Path::new("a.mp4"), json).unwrap();
        assert_eq!(info.codec_name, "hevc");
        assert_eq!((info.width, info.height), (512, 256));
        assert_eq!(info.pix_fmt, "gray12le");
        assert_eq!(info.nb_frames, Some(40));
        println!("{}", info);
    }

    #[test]
    fn test_parse_probe_json_without_stream() {
        let err = parse_probe_json(Path::new("a.mp4"), br#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, CodecError::Probe { .. }));
    }

    #[test]
    fn test_parse_probe_json_missing_size() {
        let json = br#"{"streams": [{"index": 0, "codec_name": "hevc", "pix_fmt": "gray"}]}"#;
        assert!(parse_probe_json(Path::new("a.mp4"), json).is_err());
    }
}
