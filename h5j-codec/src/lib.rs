//! Channel codec bridge for h5j containers.
//!
//! Turns single-channel frame stacks into compressed video blobs and back by
//! piping raw frames through an external video engine (ffmpeg by default).

pub mod codec;
pub mod decoder;
pub mod discovery;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod frame;
#[cfg(any(test, feature = "loopback"))]
pub mod loopback;
pub mod metadata;
pub mod pixel;

pub use codec::{ChannelCodec, CodecSettings};
pub use engine::{CodecEngine, FfmpegEngine, FfmpegSettings, RawVideoInput};
pub use error::CodecError;
pub use frame::{ChannelStack, FrameStack, Pixels};
#[cfg(any(test, feature = "loopback"))]
pub use loopback::LoopbackEngine;
pub use metadata::StreamInfo;
pub use pixel::RawPixelFormat;
