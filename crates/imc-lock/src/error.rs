#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("named mutex could not be created or opened")]
    MutexUnavailable,

    #[error("mutex acquisition timed out after the configured wait")]
    AcquireTimeout,

    #[error("SMBus host controller INUSE bit did not clear in time")]
    InUseTimeout,
}

pub type Result<T> = std::result::Result<T, Error>;
