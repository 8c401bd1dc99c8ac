use thiserror::Error;

/// Result type local to recflow-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("memory governor misconfigured: {0}")]
    Settings(String),
}
