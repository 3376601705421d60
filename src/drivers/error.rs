use thiserror::Error;
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("malformed frame: expected {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },
    #[error("malformed frame: bad header {found:02X?}")]
    FrameHeader { found: [u8; 2] },
    #[error("parameter validation failed:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
    #[error("unknown pacing mode '{0}'")]
    UnknownMode(String),
    #[error("unknown channel '{0}'")]
    UnknownChannel(String),
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("session {0} not found")]
    SessionNotFound(String),
    #[error("transport is not connected")]
    Disconnected,
    #[error("serial transport error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
}
impl LinkError {
    /// Malformed frames and validation failures are recoverable per-call outcomes;
    /// everything else comes from the link itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LinkError::Disconnected | LinkError::Serial(_) | LinkError::Io(_)
        )
    }
}
