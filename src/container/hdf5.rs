//! h5j containers stored as HDF5 files.

use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use hdf5::types::{FixedAscii, FixedUnicode, IntSize, TypeDescriptor, VarLenAscii, VarLenUnicode};
use hdf5::{Attribute, File, Group, Location};

use crate::container::{
    AttrValue, Attributes, CHANNELS_GROUP, CONTENT_TYPE_ATTR, ContainerSink, ContainerSource,
    ContentType,
};
use crate::error::{H5jError, Result};

/// Longest fixed-length string attribute read back in full.
const FIXED_STRING_LEN: usize = 1024;

pub struct H5File {
    file: File,
}

impl H5File {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    /// Creates (or truncates) a file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: File::create(path)?,
        })
    }

    fn channels(&self) -> Result<Group> {
        Ok(self.file.group(CHANNELS_GROUP)?)
    }

    fn channels_or_create(&self) -> Result<Group> {
        match self.file.group(CHANNELS_GROUP) {
            Ok(group) => Ok(group),
            Err(_) => Ok(self.file.create_group(CHANNELS_GROUP)?),
        }
    }
}

impl ContainerSource for H5File {
    fn attributes(&self) -> Result<Attributes> {
        read_attributes(&self.file)
    }

    fn channel_attributes(&self) -> Result<Attributes> {
        read_attributes(&self.channels()?)
    }

    fn channel_names(&self) -> Result<Vec<String>> {
        Ok(self.channels()?.member_names()?)
    }

    fn channel_data(&self, name: &str) -> Result<Bytes> {
        let dataset = self
            .channels()?
            .dataset(name)
            .map_err(|_| H5jError::MissingChannel(name.to_string()))?;
        // legacy writers stored the stream as signed bytes
        let data = match dataset.dtype()?.to_descriptor()? {
            TypeDescriptor::Integer(IntSize::U1) => dataset
                .read_raw::<i8>()?
                .into_iter()
                .map(|b| b as u8)
                .collect(),
            _ => dataset.read_raw::<u8>()?,
        };
        Ok(Bytes::from(data))
    }
}

impl ContainerSink for H5File {
    fn set_attributes(&mut self, attributes: &Attributes) -> Result<()> {
        write_attributes(&self.file, attributes)
    }

    fn set_channel_attributes(&mut self, attributes: &Attributes) -> Result<()> {
        write_attributes(&self.channels_or_create()?, attributes)
    }

    fn write_channel(&mut self, name: &str, data: &[u8], content_type: ContentType) -> Result<()> {
        let group = self.channels_or_create()?;
        let dataset = group.new_dataset::<u8>().shape(data.len()).create(name)?;
        dataset.write_raw(data)?;
        let tag = VarLenAscii::from_ascii(content_type.as_str()).map_err(|e| {
            H5jError::InvalidAttribute {
                name: CONTENT_TYPE_ATTR.to_string(),
                reason: e.to_string(),
            }
        })?;
        dataset
            .new_attr::<VarLenAscii>()
            .create(CONTENT_TYPE_ATTR)?
            .write_scalar(&tag)?;
        Ok(())
    }
}

fn read_attributes(location: &Location) -> Result<Attributes> {
    let mut attributes = Attributes::new();
    for name in location.attr_names()? {
        let attr = location.attr(&name)?;
        match read_attribute(&attr)? {
            Some(value) => {
                attributes.insert(name, value);
            }
            None => log::debug!("skipping attribute {} of unsupported type", name),
        }
    }
    Ok(attributes)
}

fn read_attribute(attr: &Attribute) -> Result<Option<AttrValue>> {
    let value = match attr.dtype()?.to_descriptor()? {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) => {
            AttrValue::Int(attr.read_raw::<i64>()?)
        }
        TypeDescriptor::Float(_) => AttrValue::Float(attr.read_raw::<f64>()?),
        TypeDescriptor::VarLenUnicode => AttrValue::Text(
            attr.read_raw::<VarLenUnicode>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        TypeDescriptor::VarLenAscii => AttrValue::Text(
            attr.read_raw::<VarLenAscii>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        TypeDescriptor::FixedAscii(_) => AttrValue::Text(
            attr.read_raw::<FixedAscii<FIXED_STRING_LEN>>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        TypeDescriptor::FixedUnicode(_) => AttrValue::Text(
            attr.read_raw::<FixedUnicode<FIXED_STRING_LEN>>()?
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        ),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn write_attributes(location: &Location, attributes: &Attributes) -> Result<()> {
    for (name, value) in attributes {
        match value {
            AttrValue::Int(values) => location
                .new_attr::<i64>()
                .shape(values.len())
                .create(name.as_str())?
                .write_raw(values)?,
            AttrValue::Float(values) => location
                .new_attr::<f64>()
                .shape(values.len())
                .create(name.as_str())?
                .write_raw(values)?,
            AttrValue::Text(values) => {
                let values = values
                    .iter()
                    .map(|s| VarLenUnicode::from_str(s))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| H5jError::InvalidAttribute {
                        name: name.clone(),
                        reason: e.to_string(),
                    })?;
                location
                    .new_attr::<VarLenUnicode>()
                    .shape(values.len())
                    .create(name.as_str())?
                    .write_raw(&values)?
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ChannelGeometry;

    #[test]
    fn test_hdf5_container_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.h5j");

        let mut globals = Attributes::new();
        globals.insert("image_size".to_string(), AttrValue::Float(vec![0.5, 0.5, 1.0]));
        globals.insert("channel_spec".to_string(), AttrValue::text("rgbr"));
        {
            let mut file = H5File::create(&path).unwrap();
            file.set_attributes(&globals).unwrap();
            file.set_channel_attributes(&ChannelGeometry::unpadded(2, 8, 8).to_attributes())
                .unwrap();
            file.write_channel("Channel_0", &[0, 200, 255], ContentType::Signal)
                .unwrap();
            file.write_channel("Channel_1", &[1, 2], ContentType::Reference)
                .unwrap();
        }

        let file = H5File::open(&path).unwrap();
        assert_eq!(file.attributes().unwrap(), globals);
        let geometry = ChannelGeometry::from_attributes(&file.channel_attributes().unwrap()).unwrap();
        assert_eq!(geometry, ChannelGeometry::unpadded(2, 8, 8));
        assert_eq!(file.channel_names().unwrap(), vec!["Channel_0", "Channel_1"]);
        assert_eq!(file.channel_data("Channel_0").unwrap().as_ref(), &[0, 200, 255]);
        assert!(matches!(
            file.channel_data("Channel_7"),
            Err(H5jError::MissingChannel(_))
        ));
    }

    #[test]
    fn test_signed_byte_dataset_reads_as_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.h5j");
        {
            let file = H5File::create(&path).unwrap();
            let dataset = file
                .channels_or_create()
                .unwrap()
                .new_dataset::<i8>()
                .shape(4)
                .create("Channel_0")
                .unwrap();
            dataset.write_raw(&[-1i8, 0, 127, -128]).unwrap();
        }

        let file = H5File::open(&path).unwrap();
        assert_eq!(
            file.channel_data("Channel_0").unwrap().as_ref(),
            &[255u8, 0, 127, 128]
        );
    }
}
