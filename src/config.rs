use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use h5j_codec::{ChannelCodec, CodecSettings, FfmpegEngine, FfmpegSettings};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct H5jConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Seconds one engine invocation may run; None waits forever.
    pub timeout_secs: Option<u64>,
    pub scratch_dir: Option<PathBuf>,
    pub codec_family: String,
    pub frame_rate: u32,
    /// Encoder for writes; None takes the first discovered one.
    pub codec: Option<String>,
}

impl Default for H5jConfig {
    fn default() -> Self {
        let codec = CodecSettings::default();
        let engine = FfmpegSettings::default();
        Self {
            ffmpeg: engine.ffmpeg,
            ffprobe: engine.ffprobe,
            timeout_secs: None,
            scratch_dir: codec.scratch_dir,
            codec_family: codec.family,
            frame_rate: codec.frame_rate,
            codec: None,
        }
    }
}

impl H5jConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// File named by `H5J_CONFIG` (if any), then `H5J_*` overrides.
    pub fn load() -> Self {
        let mut config = match std::env::var("H5J_CONFIG") {
            Ok(path) => std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|text| Self::from_json(&text))
                .unwrap_or_else(|e| {
                    log::warn!("ignoring config file {}: {}", path, e);
                    Self::default()
                }),
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(ffmpeg) = lookup("H5J_FFMPEG") {
            self.ffmpeg = PathBuf::from(ffmpeg);
        }
        if let Some(ffprobe) = lookup("H5J_FFPROBE") {
            self.ffprobe = PathBuf::from(ffprobe);
        }
        if let Some(secs) = lookup("H5J_TIMEOUT_SECS") {
            match secs.trim().parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(e) => log::warn!("ignoring H5J_TIMEOUT_SECS={}: {}", secs, e),
            }
        }
        if let Some(dir) = lookup("H5J_SCRATCH_DIR") {
            self.scratch_dir = Some(PathBuf::from(dir));
        }
        if let Some(codec) = lookup("H5J_CODEC") {
            self.codec = Some(codec);
        }
    }

    pub fn ffmpeg_settings(&self) -> FfmpegSettings {
        FfmpegSettings {
            ffmpeg: self.ffmpeg.clone(),
            ffprobe: self.ffprobe.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn codec_settings(&self) -> CodecSettings {
        CodecSettings {
            family: self.codec_family.clone(),
            frame_rate: self.frame_rate,
            scratch_dir: self.scratch_dir.clone(),
            ..Default::default()
        }
    }
}

pub fn config() -> &'static H5jConfig {
    static CONFIG: LazyLock<H5jConfig> = LazyLock::new(H5jConfig::load);
    &CONFIG
}

/// Process-wide codec over the configured ffmpeg. Encoder discovery runs on
/// its first use, not here.
pub fn default_codec() -> &'static ChannelCodec<FfmpegEngine> {
    static CODEC: LazyLock<ChannelCodec<FfmpegEngine>> = LazyLock::new(|| {
        let config = config();
        ChannelCodec::new(
            FfmpegEngine::new(config.ffmpeg_settings()),
            config.codec_settings(),
        )
    });
    &CODEC
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = H5jConfig::default();
        assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(config.codec_family, "hevc");
        assert_eq!(config.frame_rate, 25);
        assert!(config.ffmpeg_settings().timeout.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = H5jConfig::from_json(r#"{"timeout_secs": 30, "codec": "libx265"}"#).unwrap();
        assert_eq!(config.ffmpeg_settings().timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.codec.as_deref(), Some("libx265"));
        assert_eq!(config.codec_settings().container_extension, "mp4");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("H5J_FFMPEG", "/opt/ffmpeg/bin/ffmpeg"),
            ("H5J_TIMEOUT_SECS", "not-a-number"),
            ("H5J_SCRATCH_DIR", "/scratch"),
        ]
        .into_iter()
        .collect();
        let mut config = H5jConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.timeout_secs, None);
        assert_eq!(
            config.codec_settings().scratch_dir,
            Some(PathBuf::from("/scratch"))
        );
    }
}
