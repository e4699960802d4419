//! Channel group geometry and channel classification.

use std::fmt;

use serde::Serialize;

use crate::container::{AttrValue, Attributes};
use crate::error::{H5jError, Result};

/// Channel group attributes. `height`/`width` are logical; the encoded
/// streams carry `pad_bottom`/`pad_right` extra rows/columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelGeometry {
    pub frames: usize,
    pub height: usize,
    pub width: usize,
    pub pad_bottom: usize,
    pub pad_right: usize,
}

impl ChannelGeometry {
    const KEYS: [&'static str; 5] = ["frames", "height", "width", "pad_bottom", "pad_right"];

    pub fn unpadded(frames: usize, height: usize, width: usize) -> Self {
        Self {
            frames,
            height,
            width,
            pad_bottom: 0,
            pad_right: 0,
        }
    }

    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        let mut values = [0usize; 5];
        for (slot, key) in values.iter_mut().zip(Self::KEYS) {
            let value = attributes
                .get(key)
                .ok_or_else(|| H5jError::MissingAttribute(key.to_string()))?;
            let first = value.first_int().ok_or_else(|| H5jError::InvalidAttribute {
                name: key.to_string(),
                reason: "expected an integer".to_string(),
            })?;
            *slot = usize::try_from(first).map_err(|_| H5jError::InvalidAttribute {
                name: key.to_string(),
                reason: format!("negative value {}", first),
            })?;
        }
        let [frames, height, width, pad_bottom, pad_right] = values;
        Ok(Self {
            frames,
            height,
            width,
            pad_bottom,
            pad_right,
        })
    }

    /// Attributes as stored on disk, each a 1-element array.
    pub fn to_attributes(&self) -> Attributes {
        let values = [
            self.frames,
            self.height,
            self.width,
            self.pad_bottom,
            self.pad_right,
        ];
        Self::KEYS
            .iter()
            .zip(values)
            .map(|(key, value)| (key.to_string(), AttrValue::int(value as i64)))
            .collect()
    }

    pub fn physical_height(&self) -> usize {
        self.height + self.pad_bottom
    }

    pub fn physical_width(&self) -> usize {
        self.width + self.pad_right
    }
}

/// Channel arrangement, inferred from the dataset count: every container
/// carries one reference dataset after its signal channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelLayout {
    /// R, G, B signals at 0..3, reference at 3.
    Rgb,
    /// Y signal at 0, reference at 1.
    Mono,
}

impl ChannelLayout {
    pub fn from_dataset_count(datasets: usize) -> Result<Self> {
        match datasets.checked_sub(1) {
            Some(3) => Ok(ChannelLayout::Rgb),
            Some(1) => Ok(ChannelLayout::Mono),
            _ => Err(H5jError::UnsupportedContainerShape { datasets }),
        }
    }

    /// Signal letters in dataset order.
    pub fn letters(&self) -> &'static str {
        match self {
            ChannelLayout::Rgb => "RGB",
            ChannelLayout::Mono => "Y",
        }
    }

    pub fn signal_index(&self, letter: char) -> Result<usize> {
        self.letters()
            .chars()
            .position(|l| l == letter)
            .ok_or(H5jError::UnknownChannel {
                letter,
                layout: *self,
            })
    }

    pub fn reference_index(&self) -> usize {
        self.letters().len()
    }

    pub fn dataset_count(&self) -> usize {
        self.reference_index() + 1
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letters())
    }
}
