use std::path::Path;

use h5j_codec::{ChannelCodec, CodecError, CodecSettings, LoopbackEngine};
use ndarray::{Array3, Array4, ArrayD, IxDyn};

use crate::container::memory::MemoryContainer;
use crate::container::{AttrValue, Attributes, ContainerSource, ContentType};
use crate::error::H5jError;
use crate::layout::ChannelGeometry;
use crate::writer::{WriteOptions, encode_container, write_container};

fn loopback_codec(scratch: &Path, engine: LoopbackEngine) -> ChannelCodec<LoopbackEngine> {
    ChannelCodec::new(
        engine,
        CodecSettings {
            scratch_dir: Some(scratch.to_path_buf()),
            ..Default::default()
        },
    )
}

fn rgb_stack() -> Array4<u8> {
    Array4::from_shape_fn((4, 6, 10, 3), |(f, y, x, c)| (f * 40 + y * 3 + x + c * 60) as u8)
}

#[tokio::test]
async fn test_write_rgb_with_reference() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(scratch.path(), LoopbackEngine::default());

    let mut attributes = Attributes::new();
    attributes.insert("image_size".to_string(), AttrValue::Float(vec![0.52, 0.52, 1.0]));
    let options = WriteOptions {
        reference: Some(Array3::from_elem((4, 6, 10), 7u8)),
        attributes: attributes.clone(),
        ..Default::default()
    };
    let mut container = MemoryContainer::new();
    let geometry =
        write_container(&mut container, &codec, rgb_stack().view().into_dyn(), &options).await?;

    assert_eq!(geometry, ChannelGeometry::unpadded(4, 6, 10));
    assert_eq!(container.attributes()?, attributes);
    assert_eq!(
        ChannelGeometry::from_attributes(&container.channel_attributes()?)?,
        geometry
    );
    assert_eq!(
        container.channel_names()?,
        vec!["Channel_0", "Channel_1", "Channel_2", "Channel_3"]
    );
    for name in ["Channel_0", "Channel_1", "Channel_2"] {
        assert_eq!(container.content_type(name), Some(ContentType::Signal));
    }
    assert_eq!(container.content_type("Channel_3"), Some(ContentType::Reference));
    Ok(())
}

#[tokio::test]
async fn test_write_three_dimensional_as_one_channel() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(scratch.path(), LoopbackEngine::default());

    let mono = Array3::from_shape_fn((2, 4, 4), |(f, y, x)| (f + y + x) as u8);
    let encoded = encode_container(&codec, mono.view().into_dyn(), &WriteOptions::default()).await?;

    assert_eq!(encoded.channels.len(), 1);
    let (name, data, content_type) = &encoded.channels[0];
    assert_eq!(name, "Channel_0");
    assert_eq!(*content_type, ContentType::Signal);
    assert_eq!(codec.decode(data).await?.as_u8(), Some(&mono));
    Ok(())
}

#[tokio::test]
async fn test_write_rejects_unsupported_rank() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(scratch.path(), LoopbackEngine::default());

    for shape in [vec![4, 4], vec![1, 2, 2, 2, 2]] {
        let array = ArrayD::<u8>::zeros(IxDyn(&shape));
        let result = encode_container(&codec, array.view(), &WriteOptions::default()).await;
        assert!(matches!(
            result,
            Err(H5jError::UnsupportedRank { rank }) if rank == shape.len()
        ));
    }
    assert_eq!(codec.engine().listings(), 0);
    Ok(())
}

#[tokio::test]
async fn test_write_without_encoder_stores_nothing() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(scratch.path(), LoopbackEngine::without_encoders());

    let mut container = MemoryContainer::new();
    let result = write_container(
        &mut container,
        &codec,
        rgb_stack().view().into_dyn(),
        &WriteOptions::default(),
    )
    .await;
    assert!(matches!(
        result,
        Err(H5jError::Codec(CodecError::EngineUnavailable { .. }))
    ));
    assert_eq!(container.channel_count(), 0);
    assert!(container.attributes()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_write_encode_failure_stores_nothing() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(scratch.path(), LoopbackEngine::default().failing_encode());

    let mut container = MemoryContainer::new();
    let result = write_container(
        &mut container,
        &codec,
        rgb_stack().view().into_dyn(),
        &WriteOptions::default(),
    )
    .await;
    assert!(matches!(
        result,
        Err(H5jError::Codec(CodecError::Subprocess { .. }))
    ));
    assert_eq!(container.channel_count(), 0);
    assert_eq!(std::fs::read_dir(scratch.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_write_rejects_mismatched_reference() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(scratch.path(), LoopbackEngine::default());

    let options = WriteOptions {
        reference: Some(Array3::zeros((4, 6, 9))),
        ..Default::default()
    };
    let result = encode_container(&codec, rgb_stack().view().into_dyn(), &options).await;
    match result {
        Err(H5jError::ReferenceShape { reference, signal }) => {
            assert_eq!(reference, vec![4, 6, 9]);
            assert_eq!(signal, vec![4, 6, 10]);
        }
        other => panic!("expected a reference shape error, got {:?}", other.map(|_| ())),
    }
    Ok(())
}

#[tokio::test]
async fn test_write_with_requested_codec() -> anyhow::Result<()> {
    let scratch = tempfile::tempdir()?;
    let codec = loopback_codec(
        scratch.path(),
        LoopbackEngine::new(&["loopback_hevc", "loopback_hevc_hw"]),
    );

    let options = WriteOptions {
        codec: Some("loopback_hevc_hw".to_string()),
        ..Default::default()
    };
    let encoded = encode_container(&codec, rgb_stack().view().into_dyn(), &options).await?;
    assert_eq!(encoded.channels.len(), 3);

    let options = WriteOptions {
        codec: Some("libx265".to_string()),
        ..Default::default()
    };
    let result = encode_container(&codec, rgb_stack().view().into_dyn(), &options).await;
    assert!(matches!(
        result,
        Err(H5jError::Codec(CodecError::Subprocess { .. }))
    ));
    Ok(())
}
