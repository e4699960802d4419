use bytes::Bytes;
use h5j_codec::{ChannelCodec, CodecEngine, CodecError};
use ndarray::{Array3, ArrayViewD, Axis, Ix4};

use crate::container::{Attributes, ContainerSink, ContentType, channel_dataset_name};
use crate::error::{H5jError, Result};
use crate::layout::ChannelGeometry;

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Encoder identifier; None takes the first discovered encoder.
    pub codec: Option<String>,
    /// Reference stack stored after the signal channels. Must match the
    /// signal's (frame, height, width).
    pub reference: Option<Array3<u8>>,
    /// Global attributes stored as-is.
    pub attributes: Attributes,
}

/// Fully encoded container, ready to be stored.
#[derive(Debug, Clone)]
pub struct EncodedContainer {
    pub geometry: ChannelGeometry,
    pub attributes: Attributes,
    /// (dataset name, compressed stream, content type) in dataset order.
    pub channels: Vec<(String, Bytes, ContentType)>,
}

impl EncodedContainer {
    pub fn store<S: ContainerSink>(&self, sink: &mut S) -> Result<()> {
        sink.set_attributes(&self.attributes)?;
        sink.set_channel_attributes(&self.geometry.to_attributes())?;
        for (name, data, content_type) in &self.channels {
            sink.write_channel(name, data, *content_type)?;
        }
        Ok(())
    }
}

/// Encodes an 8-bit (frame, height, width) or (frame, height, width,
/// channel) array, one channel at a time. Nothing is stored, so a failure
/// leaves no partial container behind.
pub async fn encode_container<E: CodecEngine>(
    codec: &ChannelCodec<E>,
    array: ArrayViewD<'_, u8>,
    options: &WriteOptions,
) -> Result<EncodedContainer> {
    let channels = match array.ndim() {
        3 => array.insert_axis(Axis(3)),
        4 => array,
        rank => return Err(H5jError::UnsupportedRank { rank }),
    }
    .into_dimensionality::<Ix4>()
    .map_err(|e| CodecError::InvalidStack(e.to_string()))?;

    let (frames, height, width, count) = channels.dim();
    if let Some(reference) = &options.reference {
        if reference.shape() != [frames, height, width] {
            return Err(H5jError::ReferenceShape {
                reference: reference.shape().to_vec(),
                signal: vec![frames, height, width],
            });
        }
    }

    // fail before any encode when no encoder exists
    let codec_id = codec.resolve_encoder(options.codec.as_deref()).await?;
    log::info!(
        "encoding {} channel(s) of {} frames {}x{} with {}",
        count,
        frames,
        width,
        height,
        codec_id
    );

    let mut encoded = Vec::with_capacity(count + 1);
    for index in 0..count {
        let data = codec
            .encode_with(channels.index_axis(Axis(3), index), &codec_id)
            .await?;
        log::debug!("channel {} encoded to {} bytes", index, data.len());
        encoded.push((channel_dataset_name(index), data, ContentType::Signal));
    }
    if let Some(reference) = &options.reference {
        let data = codec.encode_with(reference.view(), &codec_id).await?;
        log::debug!("reference encoded to {} bytes", data.len());
        encoded.push((channel_dataset_name(count), data, ContentType::Reference));
    }

    Ok(EncodedContainer {
        geometry: ChannelGeometry::unpadded(frames, height, width),
        attributes: options.attributes.clone(),
        channels: encoded,
    })
}

/// Encodes `array` and stores it into `sink`. Padding is never written.
pub async fn write_container<S, E>(
    sink: &mut S,
    codec: &ChannelCodec<E>,
    array: ArrayViewD<'_, u8>,
    options: &WriteOptions,
) -> Result<ChannelGeometry>
where
    S: ContainerSink,
    E: CodecEngine,
{
    let encoded = encode_container(codec, array, options).await?;
    encoded.store(sink)?;
    Ok(encoded.geometry)
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
