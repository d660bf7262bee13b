//! imc-cli
//!
//! Minimal collaborator binary demonstrating `imc-snapshot`'s contract: open
//! the kernel-helper driver, refresh one snapshot, dump it to JSON.
//!
//! This is explicitly not the core (spec §1/§6) — no server, no GUI, no
//! persistence beyond the one file it writes.

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use imc_snapshot::{CancelFlag, HardwareContext, RefreshConfig};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,imc_snapshot=debug")))
        .init();

    info!("imc-cli {}", env!("CARGO_PKG_VERSION"));

    let config = RefreshConfig::from_env();
    let cancel = CancelFlag::new();

    let ctx = HardwareContext::open().map_err(|err| {
        error!(%err, "kernel-helper driver unavailable");
        anyhow::anyhow!(err)
    })?;

    let snapshot = imc_snapshot::refresh(&ctx, &config, &cancel).context("snapshot refresh failed")?;
    if snapshot.aborted {
        info!("refresh cancelled before completion; partial snapshot written");
    }

    let path = dump_path();
    let json = serde_json::to_string_pretty(&snapshot).context("serializing snapshot")?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;

    info!("wrote {}", path.display());
    Ok(())
}

fn dump_path() -> std::path::PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H%M");
    std::path::PathBuf::from(format!("IMC_{stamp}.json"))
}
