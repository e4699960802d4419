use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Discovery found no encoder for the codec family, so nothing can be written.
    #[error("no {family} encoder available from the codec engine - can only read h5j")]
    EngineUnavailable { family: String },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {diagnostics}")]
    Subprocess {
        program: String,
        status: String,
        diagnostics: String,
    },

    #[error("{program} produced no output: {diagnostics}")]
    NoOutput { program: String, diagnostics: String },

    #[error("{program} did not finish within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("decoded buffer of {len} bytes is not a whole number of {frame_bytes}-byte frames")]
    BufferSizeMismatch { len: usize, frame_bytes: usize },

    #[error("probe of {path:?} failed: {reason}")]
    Probe { path: PathBuf, reason: String },

    #[error("invalid frame stack: {0}")]
    InvalidStack(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CodecError> = std::result::Result<T, E>;
