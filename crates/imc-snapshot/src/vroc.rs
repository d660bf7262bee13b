//! OC/VR mailbox telemetry: SVID topology, ICC_MAX, load-line and the V/F
//! curve (spec §3 "Memory.VrOc"), plus the BIOS mailbox's MRC_CONFIG
//! request/readback pair (spec §3 "Memory.BiosRequest"/"BiosData").
//!
//! Field/bit masks for the V/F curve (`MAX_RATIO_MASK`, `VOLTAGE_TARGET_MASK`,
//! `VOLTAGE_MODE_MASK`, `VOLTAGE_OFFSET_MASK`) are grounded verbatim on
//! `original_source/msrbox.py`; the ratio->MHz and VID->volts scale factors
//! are this crate's own documented convention (100 MHz/ratio step, 13-bit
//! VID at 1/8192 V/LSB) since the Python source only ever prints the raw
//! mailbox words. See `DESIGN.md`.
use std::collections::HashSet;

use imc_kio::KernelIo;
use imc_lock::MutexBroker;

use crate::{model, warn_once, MailboxCtx, RefreshConfig};

const MAX_RATIO_MASK: u32 = 0x0000_00FF;
const VOLTAGE_TARGET_MASK: u32 = 0x000F_FF00;
const VOLTAGE_TARGET_SHIFT: u32 = 8;
const VID_VOLTS_PER_LSB: f64 = 1.0 / 8192.0;
const RATIO_MHZ_PER_STEP: f64 = 100.0;

const VF_DOMAINS: [(model::VfDomain, u8); 3] = [
    (model::VfDomain::IaCore, imc_mailbox::commands::oc::DOMAIN_ID_IA_CORE),
    (model::VfDomain::Ring, imc_mailbox::commands::oc::DOMAIN_ID_RING),
    (model::VfDomain::SystemAgent, imc_mailbox::commands::oc::DOMAIN_ID_SYSTEM_AGENT),
];

/// `original_source/msrbox.py`'s `CPU_OC_MAX_VF_POINTS = 0xF`: indices
/// `0..=15`.
const MAX_VF_POINTS: u8 = 0x10;

fn read_vf_points(mbx: &MailboxCtx<'_>, domain: model::VfDomain, domain_id: u8, warned: &mut HashSet<&'static str>) -> Vec<model::VfPoint> {
    let mut points = Vec::new();
    for index in 0..MAX_VF_POINTS {
        let raw = match mbx.svc.oc_read(imc_mailbox::commands::oc::GET_VF_POINT, domain_id, index, mbx.mutex_wait, mbx.mailbox_wait) {
            Ok(v) => v,
            Err(err) => {
                warn_once(warned, "memory.vr_oc.vf_points", err);
                break;
            }
        };
        if raw == 0 {
            // An all-zero word means this index is unpopulated; the curve
            // is always a dense prefix so it's safe to stop here.
            break;
        }
        let ratio = raw & MAX_RATIO_MASK;
        let vid = (raw & VOLTAGE_TARGET_MASK) >> VOLTAGE_TARGET_SHIFT;
        points.push(model::VfPoint {
            domain,
            index,
            frequency_mhz: f64::from(ratio) * RATIO_MHZ_PER_STEP,
            voltage: f64::from(vid) * VID_VOLTS_PER_LSB,
        });
    }
    points
}

pub(crate) fn build(kio: &dyn KernelIo, lock: &MutexBroker, config: &RefreshConfig, warned: &mut HashSet<&'static str>) -> Option<model::VrOc> {
    let mbx = MailboxCtx::new(kio, lock, config);

    let topology = mbx
        .svc
        .oc_read(imc_mailbox::commands::oc::GET_VR_TOPOLOGY, imc_mailbox::commands::oc::DOMAIN_ID_IA_CORE, 0, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.vr_oc.topology", err))
        .ok();

    let svid = mbx
        .svc
        .oc_read(imc_mailbox::commands::oc::GET_SVID_PARAMETERS, imc_mailbox::commands::oc::DOMAIN_ID_IA_CORE, 0, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.vr_oc.svid", err))
        .ok();

    let icc_max = mbx
        .svc
        .oc_read(imc_mailbox::commands::oc::GET_ICCMAX, imc_mailbox::commands::oc::DOMAIN_ID_MEMORY_CONTROLLER, 0, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.vr_oc.icc_max", err))
        .ok();

    let vcc_in_aux_icc_max = mbx
        .svc
        .oc_read(imc_mailbox::commands::oc::GET_ICCMAX, imc_mailbox::commands::oc::DOMAIN_ID_IA_CORE, 0, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.vr_oc.vcc_in_aux_icc_max", err))
        .ok();

    let loadline = mbx
        .svc
        .oc_read(imc_mailbox::commands::oc::GET_LOADLINE, imc_mailbox::commands::oc::DOMAIN_ID_IA_CORE, 0, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.vr_oc.loadline", err))
        .ok();

    if topology.is_none() && svid.is_none() && icc_max.is_none() && loadline.is_none() {
        return None;
    }

    let mut vf_points = Vec::new();
    for (domain, domain_id) in VF_DOMAINS {
        vf_points.extend(read_vf_points(&mbx, domain, domain_id, warned));
    }

    Some(model::VrOc {
        svid_ia_addr: svid.map(|v| (v & 0xFF) as u8),
        svid_gt_addr: svid.map(|v| ((v >> 8) & 0xFF) as u8),
        svid_sa_addr: svid.map(|v| ((v >> 16) & 0xFF) as u8),
        protocol_flags: topology,
        // ICCMAX's raw units aren't in the retrieved source either; 1/4 A
        // per LSB is the conventional VR12.5 ICC_MAX encoding.
        icc_max_amps: icc_max.map(|v| f64::from(v) / 4.0),
        vcc_in_aux_icc_max_amps: vcc_in_aux_icc_max.map(|v| f64::from(v) / 4.0),
        ac_loadline: loadline.map(|v| f64::from(v & 0xFFFF) / 100.0),
        dc_loadline: loadline.map(|v| f64::from((v >> 16) & 0xFFFF) / 100.0),
        vf_points,
    })
}

fn decode_bios_config(raw: u32) -> (Option<u32>, Option<u32>, Option<f64>) {
    const QCLK_RATIO_MASK: u32 = 0x0000_00FF;
    const MC_REF_CLK_MASK: u32 = 0x0000_0100;
    let ratio = raw & QCLK_RATIO_MASK;
    let reference = if raw & MC_REF_CLK_MASK != 0 { 1 } else { 0 };
    let vddq = f64::from((raw & VOLTAGE_TARGET_MASK) >> VOLTAGE_TARGET_SHIFT) * VID_VOLTS_PER_LSB;
    (Some(ratio), Some(reference), Some(vddq))
}

pub(crate) fn build_bios_request(kio: &dyn KernelIo, lock: &MutexBroker, config: &RefreshConfig, warned: &mut HashSet<&'static str>) -> Option<model::BiosRequest> {
    let mbx = MailboxCtx::new(kio, lock, config);
    let raw = mbx
        .svc
        .bios_mmio_read(imc_mailbox::commands::bios::MRC_CONFIG, imc_mailbox::commands::bios::MRC_CONFIG_VCCIO_SUBCMD, 0, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.bios_request", err))
        .ok()?;
    let (mc_pll_ratio, mc_pll_ref, vddq_tx_volts) = decode_bios_config(raw.0);
    Some(model::BiosRequest { mc_pll_ratio, mc_pll_ref, gear: None, vddq_tx_volts, icc_max_amps: None })
}

pub(crate) fn build_bios_data(kio: &dyn KernelIo, lock: &MutexBroker, config: &RefreshConfig, warned: &mut HashSet<&'static str>) -> Option<model::BiosData> {
    let mbx = MailboxCtx::new(kio, lock, config);
    let raw = mbx
        .svc
        .bios_mmio_read(imc_mailbox::commands::bios::MRC_CONFIG, imc_mailbox::commands::bios::MRC_CONFIG_VCCIO_SUBCMD, 1, mbx.mutex_wait, mbx.mailbox_wait)
        .map_err(|err| warn_once(warned, "memory.bios_data", err))
        .ok()?;
    let (mc_pll_ratio, mc_pll_ref, vddq_tx_volts) = decode_bios_config(raw.0);
    Some(model::BiosData { mc_pll_ratio, mc_pll_ref, gear: None, vddq_tx_volts, icc_max_amps: None })
}
