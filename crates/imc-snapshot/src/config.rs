//! The core's only operational parameters (spec §5, §6 "CLI surface"): three
//! timeouts and a cancel flag. Collaborators (CLI, GUI) own everything else.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default mutex-acquisition wait (spec §5: "mutex acquisition bounded by
/// `mutex_wait_timeout` (default 2 s)").
const DEFAULT_MUTEX_WAIT_MS: u64 = 2_000;
/// Default SMBus INUSE release wait (spec §5: "default 0.5 s").
const DEFAULT_INUSE_TIMEOUT_MS: u64 = 500;
/// Default mailbox busy-poll deadline (spec §5: "default 50 ms").
const DEFAULT_MAILBOX_WAIT_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    pub mutex_wait: Duration,
    pub inuse_timeout: Duration,
    pub mailbox_wait: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            mutex_wait: Duration::from_millis(DEFAULT_MUTEX_WAIT_MS),
            inuse_timeout: Duration::from_millis(DEFAULT_INUSE_TIMEOUT_MS),
            mailbox_wait: Duration::from_millis(DEFAULT_MAILBOX_WAIT_MS),
        }
    }
}

impl RefreshConfig {
    /// Overrides defaults from `IMC_MUTEX_WAIT_MS` / `IMC_INUSE_TIMEOUT_MS` /
    /// `IMC_MAILBOX_TIMEOUT_MS` when present and parseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(ms) = std::env::var("IMC_MUTEX_WAIT_MS") {
            if let Ok(val) = ms.parse() {
                config.mutex_wait = Duration::from_millis(val);
            }
        }
        if let Ok(ms) = std::env::var("IMC_INUSE_TIMEOUT_MS") {
            if let Ok(val) = ms.parse() {
                config.inuse_timeout = Duration::from_millis(val);
            }
        }
        if let Ok(ms) = std::env::var("IMC_MAILBOX_TIMEOUT_MS") {
            if let Ok(val) = ms.parse() {
                config.mailbox_wait = Duration::from_millis(val);
            }
        }

        config
    }
}

/// Cooperative cancellation flag (spec §5: "checks a caller-supplied cancel
/// flag between components"); K operations themselves remain uninterruptible.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
