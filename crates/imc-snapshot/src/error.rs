/// Only the structural failures that make the rest of a snapshot
/// meaningless are fatal (spec §7): no driver, no usable CPU identity, no
/// MCHBAR. Everything downstream of those degrades a field to `None`
/// instead of failing the call.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("kernel-helper driver unavailable")]
    DriverUnavailable,
    #[error("unsupported CPU (model id {0:#04x})")]
    UnsupportedCpu(u8),
    #[error("platform identification failed: {0}")]
    PlatformUnavailable(String),
}

impl From<imc_platform::Error> for Error {
    fn from(err: imc_platform::Error) -> Self {
        match err {
            imc_platform::Error::DriverUnavailable => Self::DriverUnavailable,
            imc_platform::Error::Unsupported(model_id) => Self::UnsupportedCpu(model_id),
            imc_platform::Error::MchbarUnavailable(raw) => {
                Self::PlatformUnavailable(format!("MCHBAR base address invalid (raw={raw:#x})"))
            }
            imc_platform::Error::Kio(e) => Self::PlatformUnavailable(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
