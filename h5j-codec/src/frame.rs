use std::fmt::{Display, Formatter};

use ndarray::{Array, Array3, Axis, Dimension, Ix3, Ix4, s};

use crate::error::{CodecError, Result};
use crate::pixel::RawPixelFormat;

/// Dense pixel array whose element width follows the decoded pixel format.
#[derive(Debug, Clone, PartialEq)]
pub enum Pixels<D: Dimension> {
    U8(Array<u8, D>),
    U16(Array<u16, D>),
}

/// (frame, row, column) stack of one channel.
pub type FrameStack = Pixels<Ix3>;

/// (frame, row, column, channel) stack of several channels.
pub type ChannelStack = Pixels<Ix4>;

impl<D: Dimension> Pixels<D> {
    pub fn shape(&self) -> &[usize] {
        match self {
            Pixels::U8(a) => a.shape(),
            Pixels::U16(a) => a.shape(),
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Pixels::U8(_) => 1,
            Pixels::U16(_) => 2,
        }
    }

    pub fn as_u8(&self) -> Option<&Array<u8, D>> {
        match self {
            Pixels::U8(a) => Some(a),
            Pixels::U16(_) => None,
        }
    }

    pub fn as_u16(&self) -> Option<&Array<u16, D>> {
        match self {
            Pixels::U8(_) => None,
            Pixels::U16(a) => Some(a),
        }
    }

    /// Row-major sample bytes, 16-bit samples in little-endian order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Pixels::U8(a) => a.iter().copied().collect(),
            Pixels::U16(a) => a.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }
}

impl FrameStack {
    /// Rebuilds a stack from a headerless raw stream of `format` frames at
    /// `height` x `width`. The frame count is implied by the buffer length;
    /// only the luma plane of multi-plane formats is kept.
    pub fn from_raw(raw: &[u8], format: RawPixelFormat, height: usize, width: usize) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(CodecError::InvalidStack(format!(
                "invalid frame size {}x{}",
                width, height
            )));
        }
        let frame_bytes = format.frame_bytes(height, width);
        if raw.len() % frame_bytes != 0 {
            return Err(CodecError::BufferSizeMismatch {
                len: raw.len(),
                frame_bytes,
            });
        }
        let frames = raw.len() / frame_bytes;
        let plane_bytes = format.plane_bytes(height, width);
        let luma = raw
            .chunks_exact(frame_bytes)
            .flat_map(|frame| &frame[..plane_bytes]);

        let stack = match format.bytes_per_sample() {
            1 => Pixels::U8(shaped(luma.copied().collect(), frames, height, width)?),
            _ => {
                let samples: Vec<u8> = luma.copied().collect();
                let values = samples
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                Pixels::U16(shaped(values, frames, height, width)?)
            }
        };
        Ok(stack)
    }

    pub fn frames(&self) -> usize {
        self.shape()[0]
    }

    pub fn height(&self) -> usize {
        self.shape()[1]
    }

    pub fn width(&self) -> usize {
        self.shape()[2]
    }

    /// Keeps the top-left `height` x `width` window of every frame.
    pub fn crop(&self, height: usize, width: usize) -> FrameStack {
        let height = height.min(self.height());
        let width = width.min(self.width());
        match self {
            Pixels::U8(a) => Pixels::U8(a.slice(s![.., ..height, ..width]).to_owned()),
            Pixels::U16(a) => Pixels::U16(a.slice(s![.., ..height, ..width]).to_owned()),
        }
    }

    /// Stacks same-shaped channels along a new trailing axis, in the order given.
    pub fn stack(channels: &[FrameStack]) -> Result<ChannelStack> {
        let first = channels
            .first()
            .ok_or_else(|| CodecError::InvalidStack("no channels to stack".to_string()))?;
        if channels.iter().any(|c| c.shape() != first.shape()) {
            return Err(CodecError::InvalidStack(
                "channels differ in shape".to_string(),
            ));
        }
        let stacked = match first {
            Pixels::U8(_) => {
                let views = channels
                    .iter()
                    .map(|c| c.as_u8().map(|a| a.view()))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(mixed_depths)?;
                Pixels::U8(ndarray::stack(Axis(3), &views).map_err(shape_error)?)
            }
            Pixels::U16(_) => {
                let views = channels
                    .iter()
                    .map(|c| c.as_u16().map(|a| a.view()))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(mixed_depths)?;
                Pixels::U16(ndarray::stack(Axis(3), &views).map_err(shape_error)?)
            }
        };
        Ok(stacked)
    }
}

impl ChannelStack {
    pub fn channels(&self) -> usize {
        self.shape()[3]
    }

    pub fn crop(&self, height: usize, width: usize) -> ChannelStack {
        let height = height.min(self.shape()[1]);
        let width = width.min(self.shape()[2]);
        match self {
            Pixels::U8(a) => Pixels::U8(a.slice(s![.., ..height, ..width, ..]).to_owned()),
            Pixels::U16(a) => Pixels::U16(a.slice(s![.., ..height, ..width, ..]).to_owned()),
        }
    }
}

impl<D: Dimension> Display for Pixels<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pixels {{ shape: {:?}, bits: {} }}",
            self.shape(),
            self.bytes_per_sample() * 8
        )
    }
}

fn shaped<T>(values: Vec<T>, frames: usize, height: usize, width: usize) -> Result<Array3<T>> {
    Array3::from_shape_vec((frames, height, width), values).map_err(shape_error)
}

fn shape_error(e: ndarray::ShapeError) -> CodecError {
    CodecError::InvalidStack(e.to_string())
}

fn mixed_depths() -> CodecError {
    CodecError::InvalidStack("channels differ in bit depth".to_string())
}
