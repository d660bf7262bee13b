//! Top-level snapshot assembly (spec §4.6): the only place in the workspace
//! that knows the full K -> M -> D -> S,X -> P composition order. Every
//! other crate in this workspace is a leaf relative to this one.
//!
//! `refresh()` aborts the whole call only on the structural failures
//! [`error::Error`] names (no driver, no supported CPU, no MCHBAR); every
//! other read that fails degrades its own field to `None` and logs once via
//! [`warn_once`].

pub mod config;
pub mod context;
mod derive;
pub mod error;
pub mod model;
mod power;
mod sa;
mod vroc;

pub use config::{CancelFlag, RefreshConfig};
pub use context::HardwareContext;
pub use error::{Error, Result};
pub use model::Snapshot;

use std::collections::HashSet;
use std::time::Duration;

use imc_decode::DdrType;
use imc_kio::KernelIo;
use imc_lock::MutexBroker;
use imc_mailbox::MailboxService;
use imc_platform::cpu::CpuFamily;
use imc_platform::inter_channel::{self, ChannelDimmInfo, InterChannel};
use imc_platform::{regmap, turnaround, Platform};
use imc_smbus::{Channel as PmicChannel, SmbusEngine};

/// Logs the first time a named field is marked absent within one refresh
/// (spec §7: "a log stream records the first error per field"), using the
/// field path itself as the dedup key.
pub(crate) fn warn_once(warned: &mut HashSet<&'static str>, field: &'static str, reason: impl std::fmt::Display) {
    if warned.insert(field) {
        tracing::warn!(field, %reason, "field unavailable for this refresh, recorded as absent");
    }
}

/// Runs one full snapshot (spec §4.6). Only [`error::Error`] aborts the
/// call; every other degraded read is folded into the tree as `None`.
pub fn refresh(ctx: &HardwareContext, config: &RefreshConfig, cancel: &CancelFlag) -> Result<Snapshot> {
    let kio: &dyn KernelIo = &ctx.driver;
    let lock: &MutexBroker = &ctx.lock;
    let mut warned: HashSet<&'static str> = HashSet::new();
    let mut aborted = false;

    let platform = imc_platform::identify(kio)?;

    let cap = platform.capabilities.clone().map(model::Cap::from);

    let memory = build_memory(kio, lock, config, cancel, &platform, &mut warned, &mut aborted);
    let vr_oc = vroc::build(kio, lock, config, &mut warned);

    Ok(Snapshot {
        time: chrono::Utc::now().to_rfc3339(),
        tool_version: env!("CARGO_PKG_VERSION"),
        cpu: model::Cpu::from(platform.cpu),
        board: None,
        cap,
        memory,
        vr_oc,
        aborted,
    })
}

/// Per-controller inter-channel read: controller 0 reuses what
/// [`imc_platform::identify`] already read, every other controller is read
/// fresh (spec §4.5 blocks 1/2 are per-controller, `Platform` only carries
/// the primary one).
fn inter_channel_for(kio: &dyn KernelIo, platform: &Platform, controller: u8, warned: &mut HashSet<&'static str>) -> Option<InterChannel> {
    if controller == 0 {
        return Some(platform.inter_channel.clone());
    }
    let base = *platform.mchbar_bases.get(controller as usize)?;
    match inter_channel::read_inter_channel(kio, base) {
        Ok(ic) => Some(ic),
        Err(err) => {
            warn_once(warned, "memory.mc[].inter_channel", err);
            None
        }
    }
}

fn channel_dimm_info_for(
    kio: &dyn KernelIo,
    platform: &Platform,
    controller: u8,
    channel: u8,
    warned: &mut HashSet<&'static str>,
) -> Option<ChannelDimmInfo> {
    if controller == 0 {
        if let Some(info) = platform.channel_dimms.iter().find(|c| c.channel == channel) {
            return Some(info.clone());
        }
    }
    let base = *platform.mchbar_bases.get(controller as usize)?;
    match inter_channel::read_channel_dimm_info(kio, base, channel) {
        Ok(info) => Some(info),
        Err(err) => {
            warn_once(warned, "memory.mc[].channel[].population", err);
            None
        }
    }
}

fn population_from(info: &ChannelDimmInfo) -> model::DimmPopulation {
    model::DimmPopulation {
        dimm_l_size_512mb: info.dimm_l_size_512mb,
        dimm_s_size_512mb: info.dimm_s_size_512mb,
        width_l: ChannelDimmInfo::dimm_width(info.dimm_l_width_code),
        width_s: ChannelDimmInfo::dimm_width(info.dimm_s_width_code),
        ranks_l: ChannelDimmInfo::ranks(info.dimm_l_ranks_code),
        ranks_s: ChannelDimmInfo::ranks(info.dimm_s_ranks_code),
        ddr5_ds_8gb: info.ddr5_ds_8gb,
        ddr5_dl_8gb: info.ddr5_dl_8gb,
    }
}

/// Whether MR4's refresh-rate field selects Fine Granularity Refresh mode
/// (bits `[5:3]`, 0 = plain 1x refresh/no FGR, any other value is a 2x/4x
/// FGR mode). No original-tool grounding names this bit range explicitly;
/// it follows the public JEDEC DDR5 MR4 layout. See `DESIGN.md`.
fn fgr_enabled(mr4: u8) -> bool {
    (mr4 >> 3) & 0x7 != 0
}

fn build_channel(
    kio: &dyn KernelIo,
    platform: &Platform,
    family: CpuFamily,
    mchbar_base: u64,
    controller: u8,
    channel: u8,
    ddr_type: Option<DdrType>,
    warned: &mut HashSet<&'static str>,
) -> Option<model::ChannelRecord> {
    let dimm_info = channel_dimm_info_for(kio, platform, controller, channel, warned)?;

    let block_addr = mchbar_base + regmap::MC_REGS_OFFSET + regmap::MC_REGS_SIZE * u64::from(channel);
    let block = match kio.phymem_read(block_addr, regmap::MC_REGS_SIZE as u32) {
        Ok(b) => b,
        Err(err) => {
            warn_once(warned, "memory.mc[].channel[].info", err);
            return None;
        }
    };

    let mut timings = regmap::for_family(family).decode(channel, &block);
    let mrs = imc_platform::mrs::decode(family, &timings.mrs_storage);
    let fgr = mrs.sequential.as_ref().map(|s| fgr_enabled(s.mr4)).unwrap_or(false);
    turnaround::apply_fgr_rule(&mut timings, fgr);

    let mut info = model::Info::from_timings(&timings, ddr_type.unwrap_or(DdrType::Ddr5));
    info.mrs = Some(model::Mrs::from(mrs));

    Some(model::ChannelRecord {
        channel,
        population: population_from(&dimm_info),
        ecc: dimm_info.ecc,
        crc: dimm_info.crc,
        info,
    })
}

fn build_memory(
    kio: &dyn KernelIo,
    lock: &MutexBroker,
    config: &RefreshConfig,
    cancel: &CancelFlag,
    platform: &Platform,
    warned: &mut HashSet<&'static str>,
    aborted: &mut bool,
) -> model::Memory {
    let mut mc = Vec::with_capacity(imc_platform::CONTROLLER_COUNT as usize);

    'controllers: for controller in 0..imc_platform::CONTROLLER_COUNT {
        if cancel.is_cancelled() {
            *aborted = true;
            break 'controllers;
        }
        let Some(mchbar_base) = platform.mchbar_bases.get(controller as usize).copied() else { continue };
        let Some(ic) = inter_channel_for(kio, platform, controller, warned) else { continue };

        let mut channels = Vec::with_capacity(2);
        for channel in 0u8..2 {
            if cancel.is_cancelled() {
                *aborted = true;
                break 'controllers;
            }
            if let Some(record) = build_channel(kio, platform, platform.family, mchbar_base, controller, channel, ic.ddr_type, warned) {
                channels.push(record);
            }
        }

        mc.push(model::McRecord {
            controller,
            ddr_type: ic.ddr_type,
            channel_l_map: ic.ch_l_map,
            channel_s_size: ic.ch_s_size,
            half_cacheline_mode: ic.half_cl_mode,
            channels,
        });
    }

    let dimm = build_dimms(kio, lock, config, cancel, warned, aborted);

    model::Memory {
        mc,
        dimm,
        power: power::build(kio, lock, config, warned),
        sa: sa::build(kio, lock, config, warned),
        bios_request: vroc::build_bios_request(kio, lock, config, warned),
        bios_data: vroc::build_bios_data(kio, lock, config, warned),
    }
}

/// Physical DIMM slots are addressed flat (spec §6's SMBus address space is
/// `SMBUS_SPD_ADDRESS + slot`); this crate maps slot `k` to
/// `(controller = k/2, channel = k%2)`, the conventional dual-channel,
/// dual-controller desktop layout. No original-tool source ties a slot
/// index to a controller/channel pair explicitly; see `DESIGN.md`.
const DIMM_SLOTS: u8 = 4;

fn build_dimms(
    kio: &dyn KernelIo,
    lock: &MutexBroker,
    config: &RefreshConfig,
    cancel: &CancelFlag,
    warned: &mut HashSet<&'static str>,
    aborted: &mut bool,
) -> Vec<model::Dimm> {
    let engine = match SmbusEngine::discover(kio, lock, config.inuse_timeout) {
        Ok(e) => e,
        Err(err) => {
            warn_once(warned, "memory.dimm", err);
            return Vec::new();
        }
    };

    let mut dimms = Vec::new();
    for slot in 0..DIMM_SLOTS {
        if cancel.is_cancelled() {
            *aborted = true;
            break;
        }
        if let Some(dimm) = build_one_dimm(&engine, config, slot, warned) {
            dimms.push(dimm);
        }
    }
    dimms
}

fn build_one_dimm(engine: &SmbusEngine<'_, MutexBroker>, config: &RefreshConfig, slot: u8, warned: &mut HashSet<&'static str>) -> Option<model::Dimm> {
    let spd = engine.spd5(slot);

    // MR3 (vendor id) is the slot-populated signal, not the SPD dump (spec
    // §8 scenario 5: "SPD5 MR3 read returns None; the slot is omitted from
    // DIMM[]"). A page-protected or failed dump below is a degraded but
    // still-present DIMM (scenario 3), so it must not also drop the slot.
    let vendor_id = match spd.vendor_id(config.mutex_wait) {
        Ok(v) => v,
        Err(err) => {
            warn_once(warned, "memory.dimm[].spd_vendorid", err);
            return None;
        }
    };

    let (dump, page_protected) = match spd.dump(config.mutex_wait) {
        Ok(d) => d,
        Err(err) => {
            warn_once(warned, "memory.dimm[].spd_eeprom", err);
            (Vec::new(), false)
        }
    };
    let temperature_celsius = spd.temperature_celsius(config.mutex_wait).ok();

    let spd_info = imc_decode::spd_decode(&dump).map(|decoded| model::SpdInfo { is_page_protected: page_protected, ..model::SpdInfo::from(decoded) });

    let dev_addr = imc_smbus::PMIC_BASE_ADDRESS + slot;
    let pmic_handle = engine.pmic(dev_addr);
    let pmic = match pmic_handle.probe(config.mutex_wait) {
        Ok(identity) if identity.vendor_id_raw == imc_decode::RICHTEK_VENDOR_RAW => {
            Some(model::PmicInfo {
                vendor_id: identity.vendor_id_raw,
                revision: identity.revision,
                swa_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::Swa),
                swb_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::Swb),
                swc_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::Swc),
                swd_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::Swd),
                v18_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::V18),
                v10_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::V10),
                vin_volts: read_channel(&pmic_handle, config.mutex_wait, PmicChannel::Vin),
            })
        }
        Ok(_) => None,
        Err(err) => {
            warn_once(warned, "memory.dimm[].pmic", err);
            None
        }
    };

    let controller = slot / 2;
    let channel = slot % 2;

    Some(model::Dimm {
        controller,
        channel,
        slot,
        spd_vendorid: vendor_id,
        spd_eeprom_hex: dump.iter().map(|b| format!("{b:02x}")).collect(),
        spd: spd_info,
        temperature_celsius,
        pmic,
    })
}

fn read_channel(handle: &imc_smbus::PmicHandle<'_, MutexBroker>, mutex_wait: Duration, channel: PmicChannel) -> Option<f64> {
    handle.read_channel(mutex_wait, channel).ok().flatten()
}

/// A thin handle over [`MailboxService`] + [`RefreshConfig`] so the
/// `power`/`sa`/`vroc` modules don't each re-thread the same four
/// arguments through every reader.
pub(crate) struct MailboxCtx<'a> {
    pub svc: MailboxService<'a, MutexBroker>,
    pub mutex_wait: Duration,
    pub mailbox_wait: Duration,
}

impl<'a> MailboxCtx<'a> {
    pub fn new(kio: &'a dyn KernelIo, lock: &'a MutexBroker, config: &RefreshConfig) -> Self {
        Self { svc: MailboxService::new(kio, lock), mutex_wait: config.mutex_wait, mailbox_wait: config.mailbox_wait }
    }
}
