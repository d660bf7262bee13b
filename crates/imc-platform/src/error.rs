#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("kernel-helper driver unavailable")]
    DriverUnavailable,

    #[error("MCHBAR could not be located or is disabled (raw value {0:#x})")]
    MchbarUnavailable(u32),

    #[error("CPU model id {0:#04x} is not in the 12th-gen or 15th-gen family tables")]
    Unsupported(u8),

    #[error(transparent)]
    Kio(#[from] imc_kio::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
