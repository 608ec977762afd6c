use std::path::PathBuf;

/// Failures that stop the renderer before the first frame.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("GPU rendering is not supported on this system: {0}")]
    Unsupported(String),
    #[error("failed to read shader at {path}: {source}")]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to observe surface size: {0}")]
    Observe(#[from] ObserveError),
    #[error("event loop error: {0}")]
    EventLoop(String),
}

/// Raised by a [`crate::surface::SizeSource`] that cannot watch in a given mode.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    #[error("observation mode rejected by host: {0}")]
    Rejected(String),
}
