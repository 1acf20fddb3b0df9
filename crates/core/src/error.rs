use crate::wave::DecodeError;

/// Result alias that carries the custom [`TempoVizError`] type.
pub type Result<T> = std::result::Result<T, TempoVizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum TempoVizError {
    /// Free-form message for conditions that do not warrant their own variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The WAV decoder rejected or failed to read a file.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Copying samples into a new frame could not allocate.
    #[error("failed to allocate {requested} samples")]
    AllocationFailure { requested: usize },
    /// A pipeline worker thread could not be spawned.
    #[error("failed to start {thread} thread: {source}")]
    ThreadStartFailure {
        thread: &'static str,
        #[source]
        source: std::io::Error,
    },
    /// A pipeline worker thread panicked before it could be joined cleanly.
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// No tracker parameter is registered under the given name.
    #[error("unknown tracker parameter `{0}`")]
    UnknownParameter(String),
    /// The operation is not allowed in the pipeline's current state.
    #[error("cannot {action} while the pipeline is {state:?}")]
    InvalidState {
        action: &'static str,
        state: crate::PipelineState,
    },
    /// Configuration could not be parsed or serialised.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl TempoVizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for TempoVizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for TempoVizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
