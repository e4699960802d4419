use h5j_codec::CodecError;

use crate::layout::ChannelLayout;

#[derive(Debug, thiserror::Error)]
pub enum H5jError {
    /// Channel dataset count the reader cannot classify.
    #[error("unsupported container: {datasets} channel datasets, expected 2 or 4")]
    UnsupportedContainerShape { datasets: usize },

    #[error(
        "unsupported array rank {rank}, expected 3 (frame, height, width) or 4 (frame, height, width, channel)"
    )]
    UnsupportedRank { rank: usize },

    #[error("channel '{letter}' does not exist in a {layout} container")]
    UnknownChannel { letter: char, layout: ChannelLayout },

    #[error("channel dataset {0} not found")]
    MissingChannel(String),

    #[error("attribute {0} not found")]
    MissingAttribute(String),

    #[error("attribute {name}: {reason}")]
    InvalidAttribute { name: String, reason: String },

    #[error("reference shape {reference:?} does not match signal shape {signal:?}")]
    ReferenceShape {
        reference: Vec<usize>,
        signal: Vec<usize>,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = H5jError> = std::result::Result<T, E>;
