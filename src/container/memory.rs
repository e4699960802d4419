use std::collections::BTreeMap;

use bytes::Bytes;

use crate::container::{Attributes, ContainerSink, ContainerSource, ContentType};
use crate::error::{H5jError, Result};

#[derive(Debug, Clone)]
struct Channel {
    data: Bytes,
    content_type: ContentType,
}

/// Container held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    attributes: Attributes,
    channel_attributes: Attributes,
    channels: BTreeMap<String, Channel>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(&self, name: &str) -> Option<ContentType> {
        self.channels.get(name).map(|c| c.content_type)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn remove_channel(&mut self, name: &str) -> Option<Bytes> {
        self.channels.remove(name).map(|c| c.data)
    }
}

impl ContainerSource for MemoryContainer {
    fn attributes(&self) -> Result<Attributes> {
        Ok(self.attributes.clone())
    }

    fn channel_attributes(&self) -> Result<Attributes> {
        Ok(self.channel_attributes.clone())
    }

    fn channel_names(&self) -> Result<Vec<String>> {
        Ok(self.channels.keys().cloned().collect())
    }

    fn channel_data(&self, name: &str) -> Result<Bytes> {
        self.channels
            .get(name)
            .map(|c| c.data.clone())
            .ok_or_else(|| H5jError::MissingChannel(name.to_string()))
    }
}

impl ContainerSink for MemoryContainer {
    fn set_attributes(&mut self, attributes: &Attributes) -> Result<()> {
        self.attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn set_channel_attributes(&mut self, attributes: &Attributes) -> Result<()> {
        self.channel_attributes
            .extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    fn write_channel(&mut self, name: &str, data: &[u8], content_type: ContentType) -> Result<()> {
        self.channels.insert(
            name.to_string(),
            Channel {
                data: Bytes::copy_from_slice(data),
                content_type,
            },
        );
        Ok(())
    }
}
