use h5j_codec::{FrameStack, Pixels};
use ndarray::{Array, ArrayView, Axis, Ix2, RemoveAxis};

/// Maximum intensity projection of `array` along `axis`.
///
/// A zero-length axis projects to zeros.
///
/// # Panics
///
/// If `axis` is out of bounds.
pub fn max_intensity_projection<T, D>(array: ArrayView<'_, T, D>, axis: Axis) -> Array<T, D::Smaller>
where
    T: Copy + Ord + Default,
    D: RemoveAxis,
{
    array.map_axis(axis, |lane| lane.iter().copied().max().unwrap_or_default())
}

/// Projects a frame stack along its frame axis.
pub fn project_frames(stack: &FrameStack) -> Pixels<Ix2> {
    match stack {
        Pixels::U8(a) => Pixels::U8(max_intensity_projection(a.view(), Axis(0))),
        Pixels::U16(a) => Pixels::U16(max_intensity_projection(a.view(), Axis(0))),
    }
}
