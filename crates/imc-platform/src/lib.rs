//! Platform identification and register-map decoding (component P, spec
//! §4.5): CPU identity, MCHBAR/DMIBAR discovery, the inter-channel and
//! per-channel DIMM-characteristics blocks, the per-generation MC register
//! map, derived turnaround timings, MR-storage parsing and the CAPID0
//! capability DWORDs.

pub mod cap;
pub mod cpu;
mod error;
pub mod inter_channel;
pub mod mchbar;
pub mod mrs;
pub mod regmap;
pub mod turnaround;

pub use error::{Error, Result};

use imc_kio::KernelIo;

/// Everything `refresh()` (component M, spec §4.6) needs about the running
/// platform, gathered in CPU→MCHBAR→register-map order (spec §4.5 "P first
/// identifies the CPU, then walks MCHBAR/DMIBAR").
#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub cpu: cpu::CpuIdentity,
    pub family: cpu::CpuFamily,
    pub mchbar_bases: Vec<u64>,
    pub dmibar_base: Option<u64>,
    pub inter_channel: inter_channel::InterChannel,
    pub channel_dimms: Vec<inter_channel::ChannelDimmInfo>,
    pub capabilities: Option<cap::Capabilities>,
}

/// Number of IMC controllers this crate enumerates per spec §3 (two
/// controllers, mirroring the reference platforms' dual-MC layout).
pub const CONTROLLER_COUNT: u8 = 2;

/// Discovers CPU identity and the MCHBAR-rooted blocks that do not require
/// a per-channel register read (spec §4.5 blocks 0-2). Per-channel MC
/// register blocks (block 3) and MR storage (block 4) are decoded
/// separately via [`regmap::for_family`] and [`mrs::decode`], once the
/// caller has read each channel's `0x800`-byte block at
/// `mchbar_base + regmap::MC_REGS_OFFSET + channel * regmap::MC_REGS_SIZE`.
pub fn identify(kio: &dyn KernelIo) -> Result<Platform> {
    let identity = cpu::identify()?;
    let family = identity.family_bucket()?;

    let mut mchbar_bases = Vec::with_capacity(CONTROLLER_COUNT as usize);
    for controller in 0..CONTROLLER_COUNT {
        mchbar_bases.push(mchbar::mchbar_base(kio, controller)?);
    }
    let dmibar_base = mchbar::dmibar_base(kio);

    let primary_mchbar = mchbar_bases[0];
    let inter_channel = inter_channel::read_inter_channel(kio, primary_mchbar)?;

    let mut channel_dimms = Vec::new();
    for channel in 0..2u8 {
        if let Ok(info) = inter_channel::read_channel_dimm_info(kio, primary_mchbar, channel) {
            channel_dimms.push(info);
        } else {
            tracing::warn!(channel, "failed to read per-channel DIMM characteristics");
        }
    }

    let capabilities = match cap::read_capabilities(kio) {
        Ok(c) => Some(c),
        Err(err) => {
            tracing::warn!(%err, "failed to read platform capability DWORDs");
            None
        }
    };

    Ok(Platform {
        cpu: identity,
        family,
        mchbar_bases,
        dmibar_base,
        inter_channel,
        channel_dimms,
        capabilities,
    })
}
