use bytes::Bytes;
use ndarray::ArrayView3;

use crate::codec::CodecSettings;
use crate::engine::{CodecEngine, RawVideoInput};
use crate::error::{CodecError, Result};
use crate::pixel::RawPixelFormat;

/// Encodes an 8-bit (frame, row, column) stack with `codec_id` and returns
/// the bytes of the resulting container file.
///
/// The engine writes into a scratch file that is removed when this returns,
/// including when the engine fails part way through.
pub async fn encode_channel<E: CodecEngine>(
    engine: &E,
    settings: &CodecSettings,
    frames: ArrayView3<'_, u8>,
    codec_id: &str,
) -> Result<Bytes> {
    let (count, height, width) = frames.dim();
    if count == 0 || height == 0 || width == 0 {
        return Err(CodecError::InvalidStack(format!(
            "cannot encode {} frames of {}x{}",
            count, width, height
        )));
    }

    let frames = frames.as_standard_layout();
    let raw = frames
        .as_slice()
        .ok_or_else(|| CodecError::InvalidStack("stack is not contiguous".to_string()))?;
    let input = RawVideoInput {
        width,
        height,
        frame_rate: settings.frame_rate,
        pixel_format: RawPixelFormat::ENCODE,
    };

    let output = settings.scratch_file()?.into_temp_path();
    log::debug!(
        "encoding {} frames of {}x{} with {} into {:?}",
        count,
        width,
        height,
        codec_id,
        output
    );
    engine
        .transcode_to_container(raw, &input, codec_id, &output)
        .await?;

    let encoded = tokio::fs::read(&output).await?;
    output.close()?;
    if encoded.is_empty() {
        return Err(CodecError::NoOutput {
            program: codec_id.to_string(),
            diagnostics: "encoded container is empty".to_string(),
        });
    }
    Ok(Bytes::from(encoded))
}
