//! In-process engine that "encodes" by storing raw frames behind a small
//! header. Lossless, needs no ffmpeg, and can be told to fail, which makes it
//! the engine of choice for tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::{CodecEngine, RawVideoInput};
use crate::error::{CodecError, Result};
use crate::metadata::StreamInfo;
use crate::pixel::RawPixelFormat;

const MAGIC: &[u8; 4] = b"H5LB";
const PROGRAM: &str = "loopback";

#[derive(Debug)]
pub struct LoopbackEngine {
    encoders: Vec<String>,
    fail_encode: bool,
    fail_decode: bool,
    listings: AtomicUsize,
}

impl Default for LoopbackEngine {
    fn default() -> Self {
        Self::new(&["loopback_hevc"])
    }
}

impl LoopbackEngine {
    pub fn new(encoders: &[&str]) -> Self {
        Self {
            encoders: encoders.iter().map(|e| e.to_string()).collect(),
            fail_encode: false,
            fail_decode: false,
            listings: AtomicUsize::new(0),
        }
    }

    /// Engine that offers no encoder, like an ffmpeg built without HEVC.
    pub fn without_encoders() -> Self {
        Self::new(&[])
    }

    /// Encodes write half a file and then fail.
    pub fn failing_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    /// Decodes fail after the probe.
    pub fn failing_decode(mut self) -> Self {
        self.fail_decode = true;
        self
    }

    /// Number of times encoders were listed.
    pub fn listings(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Builds a blob as this engine would store it, e.g. to fake a 12-bit channel.
    pub fn container_bytes(pix_fmt: &str, width: u32, height: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + 16 + pix_fmt.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.push(pix_fmt.len() as u8);
        out.extend_from_slice(pix_fmt.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn parse(path: &Path, data: &[u8]) -> Result<(StreamInfo, usize)> {
        let invalid = |reason: &str| CodecError::Probe {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        if data.len() < 13 || &data[..4] != MAGIC {
            return Err(invalid("not a loopback stream"));
        }
        let width = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let height = u32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let fmt_len = data[12] as usize;
        let body = 13 + fmt_len;
        let pix_fmt = data
            .get(13..body)
            .and_then(|b| std::str::from_utf8(b).ok())
            .ok_or_else(|| invalid("truncated header"))?;
        let info = StreamInfo {
            index: 0,
            codec_name: PROGRAM.to_string(),
            width,
            height,
            pix_fmt: pix_fmt.to_string(),
            rate: "25/1".to_string(),
            nb_frames: None,
        };
        Ok((info, body))
    }

    fn failure(diagnostics: String) -> CodecError {
        CodecError::Subprocess {
            program: PROGRAM.to_string(),
            status: "exit status: 1".to_string(),
            diagnostics,
        }
    }
}

impl CodecEngine for LoopbackEngine {
    async fn list_encoders(&self, _family: &str) -> Result<Vec<String>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self.encoders.clone())
    }

    async fn probe(&self, path: &Path) -> Result<StreamInfo> {
        let data = tokio::fs::read(path).await?;
        Ok(Self::parse(path, &data)?.0)
    }

    async fn transcode_to_raw(&self, path: &Path, format: RawPixelFormat) -> Result<Vec<u8>> {
        let data = tokio::fs::read(path).await?;
        let (info, body) = Self::parse(path, &data)?;
        if self.fail_decode {
            return Err(Self::failure("Invalid data found when processing input".to_string()));
        }
        let payload = &data[body..];
        let stored = RawPixelFormat::for_probed(&info.pix_fmt);

        match (stored, format) {
            (stored, format) if stored == format => Ok(payload.to_vec()),
            (RawPixelFormat::Gray, RawPixelFormat::Yuv444p) => {
                let plane = (info.width as usize)
                    .checked_mul(info.height as usize)
                    .filter(|&plane| plane > 0)
                    .ok_or_else(|| {
                        Self::failure(format!("invalid frame size {}x{}", info.width, info.height))
                    })?;
                let mut out = Vec::with_capacity(payload.len() * 3);
                for luma in payload.chunks(plane) {
                    out.extend_from_slice(luma);
                    out.resize(out.len() + 2 * plane, 128);
                }
                Ok(out)
            }
            (stored, format) => Err(Self::failure(format!(
                "cannot convert {} to {}",
                stored, format
            ))),
        }
    }

    async fn transcode_to_container(
        &self,
        raw: &[u8],
        input: &RawVideoInput,
        codec_id: &str,
        output: &Path,
    ) -> Result<()> {
        if !self.encoders.iter().any(|e| e == codec_id) {
            return Err(Self::failure(format!("Unknown encoder '{}'", codec_id)));
        }
        let blob = Self::container_bytes(
            input.pixel_format.ffmpeg_name(),
            input.width as u32,
            input.height as u32,
            raw,
        );
        if self.fail_encode {
            tokio::fs::write(output, &blob[..blob.len() / 2]).await?;
            return Err(Self::failure("Conversion failed!".to_string()));
        }
        tokio::fs::write(output, blob).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_frames_do_not_convert() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.mp4");
        tokio::fs::write(&path, LoopbackEngine::container_bytes("gray", 0, 4, &[1, 2])).await?;

        let engine = LoopbackEngine::default();
        let err = engine
            .transcode_to_raw(&path, RawPixelFormat::Yuv444p)
            .await
            .unwrap_err();
        match err {
            CodecError::Subprocess { diagnostics, .. } => {
                assert!(diagnostics.contains("invalid frame size 0x4"))
            }
            other => panic!("expected subprocess failure, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_gray_converts_to_planar_444() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gray.mp4");
        tokio::fs::write(&path, LoopbackEngine::container_bytes("gray", 2, 1, &[7, 9])).await?;

        let raw = LoopbackEngine::default()
            .transcode_to_raw(&path, RawPixelFormat::Yuv444p)
            .await?;
        assert_eq!(raw, vec![7, 9, 128, 128, 128, 128]);
        Ok(())
    }
}
