//! Cross-process mutex broker (component M, spec §4.2/§5).
//!
//! Three named, system-wide mutexes serialise concurrent access to the
//! SMBus host controller, the PCODE/MRC "BIOS mailbox" and the OC/SVID
//! mailbox. Every resource offers scoped acquisition with a configurable
//! wait, falling back from a `Local\…` namespace to a `Global\…` namespace
//! so multiple UIDs and sessions coordinate correctly (spec explicitly
//! requires `Global\…` scope in the end — see §5 "Shared-resource policy").

mod error;
mod resource;
mod windows_mutex;

pub use error::{Error, Result};
pub use resource::Resource;

use std::time::Duration;

/// Scoped acquisition of the three named mutexes. Implementations own their
/// resources explicitly (design note §9: no process-wide statics); callers
/// are generic over this trait rather than depending on a concrete handle.
///
/// `with_lock` is generic over the caller's own error type `E` rather than
/// fixed to [`Error`]: acquisition failures convert into `E` via `From`
/// (every crate upstack derives that conversion with `thiserror`'s
/// `#[from]`), so `f` can return its own `Result<T, E>` unchanged instead of
/// threading a `map_err` through every call site.
pub trait LockBroker: Send + Sync {
    /// Acquire `which`, run `f`, then release — guaranteed on every exit
    /// path including a panic unwinding through `f` (spec §8 "mutex
    /// round-trip" invariant).
    fn with_lock<T, E: From<Error>>(
        &self,
        which: Resource,
        wait: Duration,
        f: impl FnOnce() -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>;
}

pub use windows_mutex::MutexBroker;
