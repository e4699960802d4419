use std::path::PathBuf;

use bytes::Bytes;
use ndarray::ArrayView3;
use tempfile::NamedTempFile;

use crate::decoder::decode_channel;
use crate::discovery::EncoderCatalog;
use crate::encoder::encode_channel;
use crate::engine::CodecEngine;
use crate::error::{CodecError, Result};
use crate::frame::FrameStack;

#[derive(Debug, Clone)]
pub struct CodecSettings {
    /// Codec family whose encoders are discovered, e.g. "hevc".
    pub family: String,
    /// Nominal rate stamped on encoded stacks. Frames are z-slices, so the
    /// value carries no meaning beyond satisfying the container.
    pub frame_rate: u32,
    /// None uses the system temp dir.
    pub scratch_dir: Option<PathBuf>,
    /// Extension of scratch files, picks the engine's container format.
    pub container_extension: String,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            family: "hevc".to_string(),
            frame_rate: 25,
            scratch_dir: None,
            container_extension: "mp4".to_string(),
        }
    }
}

impl CodecSettings {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Fresh uniquely named file in the scratch dir, deleted on drop.
    pub(crate) fn scratch_file(&self) -> Result<NamedTempFile> {
        let suffix = format!(".{}", self.container_extension);
        let file = tempfile::Builder::new()
            .prefix("h5j_")
            .suffix(&suffix)
            .tempfile_in(self.scratch_dir())?;
        Ok(file)
    }
}

/// Encodes and decodes single channels through a codec engine.
///
/// Encoder discovery runs on the first encode (or explicit query) and is
/// cached until [`ChannelCodec::reset_encoders`].
pub struct ChannelCodec<E> {
    engine: E,
    settings: CodecSettings,
    catalog: EncoderCatalog,
}

impl<E: CodecEngine> ChannelCodec<E> {
    pub fn new(engine: E, settings: CodecSettings) -> Self {
        let catalog = EncoderCatalog::new(&settings.family);
        Self {
            engine,
            settings,
            catalog,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    pub async fn supported_encoders(&self) -> Vec<String> {
        self.catalog.get(&self.engine).await
    }

    pub fn reset_encoders(&self) {
        self.catalog.reset();
    }

    /// Picks the encoder for a write: `requested` if given, else the first
    /// discovered one. Fails when discovery found nothing.
    pub async fn resolve_encoder(&self, requested: Option<&str>) -> Result<String> {
        let encoders = self.supported_encoders().await;
        if encoders.is_empty() {
            return Err(CodecError::EngineUnavailable {
                family: self.catalog.family().to_string(),
            });
        }
        match requested {
            Some(codec) => {
                if !encoders.iter().any(|e| e == codec) {
                    log::warn!(
                        "encoder {} not among discovered {} encoders, passing it through",
                        codec,
                        self.catalog.family()
                    );
                }
                Ok(codec.to_string())
            }
            None => Ok(encoders[0].clone()),
        }
    }

    pub async fn decode(&self, data: &[u8]) -> Result<FrameStack> {
        decode_channel(&self.engine, &self.settings, data).await
    }

    pub async fn encode(&self, frames: ArrayView3<'_, u8>, codec_id: Option<&str>) -> Result<Bytes> {
        let codec = self.resolve_encoder(codec_id).await?;
        self.encode_with(frames, &codec).await
    }

    /// Encodes with an encoder already picked by [`ChannelCodec::resolve_encoder`].
    /// The catalog is not consulted.
    pub async fn encode_with(&self, frames: ArrayView3<'_, u8>, codec_id: &str) -> Result<Bytes> {
        encode_channel(&self.engine, &self.settings, frames, codec_id).await
    }
}

#[cfg(test)]
#[path = "codec_test.rs"]
mod codec_test;
