//! Read and write h5j microscopy containers.
//!
//! A container holds one compressed video stream per channel of a
//! (frame, height, width[, channel]) 8-bit stack. The streams are produced and
//! consumed by an external video engine, see [`h5j_codec`].

pub mod config;
pub mod container;
pub mod error;
pub mod layout;
pub mod mip;
pub mod reader;
pub mod writer;

pub use container::memory::MemoryContainer;
pub use container::{AttrValue, Attributes, ContainerSink, ContainerSource, ContentType};
pub use error::{H5jError, Result};
pub use h5j_codec::{ChannelCodec, ChannelStack, CodecEngine, CodecError, FrameStack, Pixels};
pub use layout::{ChannelGeometry, ChannelLayout};
pub use reader::{
    ContainerSummary, H5jData, ReadOptions, Signal, describe_container, read_container,
};
pub use writer::{EncodedContainer, WriteOptions, encode_container, write_container};

#[cfg(feature = "hdf5")]
pub use container::hdf5::H5File;

/// Encoders of the configured family the process-wide engine offers.
/// Empty when none was found; the list is cached after the first call.
pub async fn list_supported_encoders() -> Vec<String> {
    config::default_codec().supported_encoders().await
}

/// Reads an h5j file through the process-wide engine.
#[cfg(feature = "hdf5")]
pub async fn read<P: AsRef<std::path::Path>>(path: P, options: &ReadOptions) -> Result<H5jData> {
    let file = H5File::open(path)?;
    read_container(&file, config::default_codec(), options).await
}

/// Writes `array` to an h5j file through the process-wide engine. Every
/// channel is encoded before the file is created, so an encode failure
/// leaves no file behind.
#[cfg(feature = "hdf5")]
pub async fn write<P: AsRef<std::path::Path>>(
    path: P,
    array: ndarray::ArrayViewD<'_, u8>,
    options: &WriteOptions,
) -> Result<ChannelGeometry> {
    let mut options = options.clone();
    if options.codec.is_none() {
        options.codec = config::config().codec.clone();
    }
    let encoded = encode_container(config::default_codec(), array, &options).await?;
    let mut file = H5File::create(path)?;
    encoded.store(&mut file)?;
    Ok(encoded.geometry)
}
