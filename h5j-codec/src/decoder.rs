use crate::codec::CodecSettings;
use crate::engine::CodecEngine;
use crate::error::Result;
use crate::frame::FrameStack;
use crate::pixel::RawPixelFormat;

/// Decodes one compressed channel blob into a frame stack.
///
/// The blob is written to a scratch file that is removed when this returns,
/// whether or not the engine succeeded. The frame count comes from the size
/// of the decoded stream, not from container metadata.
pub async fn decode_channel<E: CodecEngine>(
    engine: &E,
    settings: &CodecSettings,
    data: &[u8],
) -> Result<FrameStack> {
    let temp = settings.scratch_file()?;
    tokio::fs::write(temp.path(), data).await?;

    let info = engine.probe(temp.path()).await?;
    let format = RawPixelFormat::for_probed(&info.pix_fmt);
    log::debug!(
        "decoding {} bytes of {} {}x{} {} as {}",
        data.len(),
        info.codec_name,
        info.width,
        info.height,
        info.pix_fmt,
        format
    );

    let raw = engine.transcode_to_raw(temp.path(), format).await?;
    FrameStack::from_raw(&raw, format, info.height as usize, info.width as usize)
}
