#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("mailbox RunBusy did not clear within the configured wait")]
    Timeout,

    #[error("mailbox command not supported on this carrier")]
    Unsupported,

    #[error(transparent)]
    Kio(#[from] imc_kio::Error),

    #[error(transparent)]
    Lock(#[from] imc_lock::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
