//! h5j container model.
//!
//! ```text
//! /                       global attributes (passed through untouched)
//! /Channels               frames, height, width, pad_bottom, pad_right
//! /Channels/Channel_0     compressed stream, content_type = "signal"
//! ...
//! /Channels/Channel_K-1   last dataset is the reference when present
//! ```

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod memory;

pub const CHANNELS_GROUP: &str = "Channels";
pub const CONTENT_TYPE_ATTR: &str = "content_type";

pub type Attributes = BTreeMap<String, AttrValue>;

/// Attribute value. Numeric attributes are arrays; a scalar is a 1-element array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl AttrValue {
    pub fn int(value: i64) -> Self {
        AttrValue::Int(vec![value])
    }

    pub fn text(value: &str) -> Self {
        AttrValue::Text(vec![value.to_string()])
    }

    /// First element of an integer attribute.
    pub fn first_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(values) => values.first().copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Signal,
    Reference,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Signal => "signal",
            ContentType::Reference => "reference",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn channel_dataset_name(index: usize) -> String {
    format!("Channel_{}", index)
}

/// Read side of a container.
pub trait ContainerSource {
    fn attributes(&self) -> Result<Attributes>;
    fn channel_attributes(&self) -> Result<Attributes>;
    /// Names of the datasets in the channel group.
    fn channel_names(&self) -> Result<Vec<String>>;
    /// Raw bytes of one channel dataset.
    fn channel_data(&self, name: &str) -> Result<Bytes>;
}

/// Write side of a container.
pub trait ContainerSink {
    fn set_attributes(&mut self, attributes: &Attributes) -> Result<()>;
    fn set_channel_attributes(&mut self, attributes: &Attributes) -> Result<()>;
    fn write_channel(&mut self, name: &str, data: &[u8], content_type: ContentType) -> Result<()>;
}
