#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("no Intel SMBus host controller matched the discovery predicate")]
    ControllerNotFound,

    #[error("SMBus transaction reported BUS_ERR/DEV_ERR/FAILED (status {0:#x})")]
    BusError(u8),

    #[error("SMBus INUSE did not clear within the configured wait")]
    Timeout,

    #[error("SPD5 page is write-protected")]
    PageProtected,

    #[error(transparent)]
    Kio(#[from] imc_kio::Error),

    #[error(transparent)]
    Lock(#[from] imc_lock::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
