use h5j_codec::{ChannelCodec, ChannelStack, CodecEngine, FrameStack};
use serde::Serialize;

use crate::container::{Attributes, ContainerSource, channel_dataset_name};
use crate::error::Result;
use crate::layout::{ChannelGeometry, ChannelLayout};

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Signal letters to decode, in output order ("RGB", "BR", "Y", ...).
    /// None reads every signal channel; an empty string reads none.
    pub channels: Option<String>,
    /// Also decode the reference channel.
    pub reference: bool,
    /// Crop decoded stacks to the logical height/width. Off by default, so
    /// arrays keep the padded size of the encoded streams.
    pub crop_padding: bool,
}

impl ReadOptions {
    pub fn channels(mut self, letters: &str) -> Self {
        self.channels = Some(letters.to_string());
        self
    }

    pub fn with_reference(mut self) -> Self {
        self.reference = true;
        self
    }

    pub fn cropped(mut self) -> Self {
        self.crop_padding = true;
        self
    }
}

/// Decoded signal: one channel as (frame, row, column), several stacked
/// along a trailing channel axis in request order.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Single(FrameStack),
    Stacked(ChannelStack),
}

impl Signal {
    pub fn shape(&self) -> &[usize] {
        match self {
            Signal::Single(stack) => stack.shape(),
            Signal::Stacked(stack) => stack.shape(),
        }
    }

    pub fn as_single(&self) -> Option<&FrameStack> {
        match self {
            Signal::Single(stack) => Some(stack),
            Signal::Stacked(_) => None,
        }
    }

    pub fn as_stacked(&self) -> Option<&ChannelStack> {
        match self {
            Signal::Single(_) => None,
            Signal::Stacked(stack) => Some(stack),
        }
    }
}

#[derive(Debug, Clone)]
pub struct H5jData {
    pub signal: Option<Signal>,
    pub reference: Option<FrameStack>,
    pub attributes: Attributes,
    pub geometry: ChannelGeometry,
    pub layout: ChannelLayout,
}

/// Container description that needs no decoding.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSummary {
    pub attributes: Attributes,
    pub geometry: ChannelGeometry,
    pub channels: Vec<String>,
    /// None when the dataset count matches no known layout.
    pub layout: Option<ChannelLayout>,
}

pub fn describe_container<S: ContainerSource>(source: &S) -> Result<ContainerSummary> {
    let attributes = source.attributes()?;
    let geometry = ChannelGeometry::from_attributes(&source.channel_attributes()?)?;
    let channels = source.channel_names()?;
    let layout = ChannelLayout::from_dataset_count(channels.len()).ok();
    Ok(ContainerSummary {
        attributes,
        geometry,
        channels,
        layout,
    })
}

/// Reads the requested channels of a container, decoding each one through
/// `codec` in turn. Any channel failure aborts the whole read.
pub async fn read_container<S, E>(
    source: &S,
    codec: &ChannelCodec<E>,
    options: &ReadOptions,
) -> Result<H5jData>
where
    S: ContainerSource,
    E: CodecEngine,
{
    let attributes = source.attributes()?;
    let geometry = ChannelGeometry::from_attributes(&source.channel_attributes()?)?;
    let layout = ChannelLayout::from_dataset_count(source.channel_names()?.len())?;

    let letters = options
        .channels
        .clone()
        .unwrap_or_else(|| layout.letters().to_string());
    // resolve every letter before touching the codec
    let indices = letters
        .chars()
        .map(|letter| layout.signal_index(letter))
        .collect::<Result<Vec<_>>>()?;

    let mut decoded = Vec::with_capacity(indices.len());
    for (letter, index) in letters.chars().zip(indices) {
        log::debug!("reading signal channel {} from dataset {}", letter, index);
        decoded.push(read_channel(source, codec, index, &geometry, options.crop_padding).await?);
    }
    let signal = match decoded.len() {
        0 => None,
        1 => decoded.pop().map(Signal::Single),
        _ => Some(Signal::Stacked(FrameStack::stack(&decoded)?)),
    };

    let reference = if options.reference {
        let index = layout.reference_index();
        log::debug!("reading reference channel from dataset {}", index);
        Some(read_channel(source, codec, index, &geometry, options.crop_padding).await?)
    } else {
        None
    };

    Ok(H5jData {
        signal,
        reference,
        attributes,
        geometry,
        layout,
    })
}

async fn read_channel<S, E>(
    source: &S,
    codec: &ChannelCodec<E>,
    index: usize,
    geometry: &ChannelGeometry,
    crop: bool,
) -> Result<FrameStack>
where
    S: ContainerSource,
    E: CodecEngine,
{
    let data = source.channel_data(&channel_dataset_name(index))?;
    let stack = codec.decode(&data).await?;
    if (stack.height(), stack.width()) != (geometry.physical_height(), geometry.physical_width()) {
        log::warn!(
            "channel {} decodes to {}x{}, attributes say {}x{}",
            index,
            stack.width(),
            stack.height(),
            geometry.physical_width(),
            geometry.physical_height()
        );
    }
    if crop {
        Ok(stack.crop(geometry.height, geometry.width))
    } else {
        Ok(stack)
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod reader_test;
