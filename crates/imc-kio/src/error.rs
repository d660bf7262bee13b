/// Error kinds returned by the kernel-helper transport.
///
/// `DriverUnavailable` is fatal for a whole snapshot (§7 of the spec this
/// crate implements); every other variant degrades a single field to
/// "absent" in the caller.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("could not open the kernel helper device")]
    DriverUnavailable,

    #[error("driver returned sentinel failure {0:#x}")]
    IoError(u32),

    #[error("operation not supported by this driver build")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Sentinel values the driver is documented to return in the output record's
/// `status` field instead of a successful payload. Anything outside this
/// table but still non-zero is still mapped to `IoError`, just without a
/// friendly name attached by `classify`.
pub(crate) const STATUS_OK: u32 = 0;
pub(crate) const STATUS_MMIO_WRITE_FAILED: u32 = 0xE000_0001;
pub(crate) const STATUS_TIMEOUT: u32 = 0xE000_0002;
pub(crate) const STATUS_LOCKED: u32 = 0xE000_0003;
pub(crate) const STATUS_UNSUPPORTED: u32 = 0xE000_0004;

pub(crate) fn describe(status: u32) -> &'static str {
    match status {
        STATUS_MMIO_WRITE_FAILED => "mmio write failed",
        STATUS_TIMEOUT => "driver-level timeout",
        STATUS_LOCKED => "resource locked by another caller",
        STATUS_UNSUPPORTED => "operation unsupported",
        _ => "unknown driver failure",
    }
}

pub(crate) fn classify(status: u32) -> Error {
    match status {
        STATUS_UNSUPPORTED => Error::Unsupported,
        other => {
            tracing::debug!(status = %format!("{other:#x}"), reason = describe(other), "kio sentinel failure");
            Error::IoError(other)
        }
    }
}
