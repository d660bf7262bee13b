//! PCH SMBus host controller discovery (spec §4.4, grounded on
//! `original_source/hardware.py`'s `PCI_ID_SMBUS_INTEL` table and
//! `original_source/memspd.py`'s `find_smb_controller`).

use imc_kio::KernelIo;

use crate::error::{Error, Result};

const PCI_VENDOR_ID_INTEL: u16 = 0x8086;
const PCI_CLASS_SERIAL_BUS_CONTROLLER: u8 = 0x0C;
const PCI_SUBCLASS_SMBUS: u8 = 0x05;

/// Device ids of Intel PCH/SoC SMBus host controllers this tool recognises.
/// Client platforms from 12th through 15th gen only; server/legacy entries
/// from the original table are kept for the discovery predicate's benefit
/// (an unrecognised-but-otherwise-valid controller is still rejected, per
/// spec, unless its DID is in this table).
pub const PCI_ID_SMBUS_INTEL: &[(u16, &str)] = &[
    (0x31d4, "GEMINILAKE_SMBUS"),
    (0x34a3, "ICELAKE_LP_SMBUS"),
    (0x38a3, "ICELAKE_N_SMBUS"),
    (0x3b30, "5_3400_SERIES_SMBUS"),
    (0x43a3, "TIGERLAKE_H_SMBUS"),
    (0x4b23, "ELKHART_LAKE_SMBUS"),
    (0x4da3, "JASPER_LAKE_SMBUS"),
    (0x51a3, "ALDER_LAKE_P_SMBUS"),
    (0x54a3, "ALDER_LAKE_M_SMBUS"),
    (0x5796, "BIRCH_STREAM_SMBUS"),
    (0x5ad4, "BROXTON_SMBUS"),
    (0x7722, "ARROW_LAKE_H_SMBUS"),
    (0x7a23, "RAPTOR_LAKE_S_SMBUS"),
    (0x7aa3, "ALDER_LAKE_S_SMBUS"),
    (0x7e22, "METEOR_LAKE_P_SMBUS"),
    (0x7f23, "ARROW_LAKE_PCH_S_SMBUS"),
    (0x8c22, "LYNXPOINT_SMBUS"),
    (0x8ca2, "WILDCATPOINT_SMBUS"),
    (0x8d22, "WELLSBURG_SMBUS"),
    (0x8d7d, "WELLSBURG_SMBUS_MS0"),
    (0x8d7e, "WELLSBURG_SMBUS_MS1"),
    (0x8d7f, "WELLSBURG_SMBUS_MS2"),
    (0x9c22, "LYNXPOINT_LP_SMBUS"),
    (0x9ca2, "WILDCATPOINT_LP_SMBUS"),
    (0x9d23, "SUNRISEPOINT_LP_SMBUS"),
    (0x9da3, "CANNONLAKE_LP_SMBUS"),
    (0xa0a3, "TIGERLAKE_LP_SMBUS"),
    (0xa123, "SUNRISEPOINT_H_SMBUS"),
    (0xa1a3, "LEWISBURG_SMBUS"),
    (0xa223, "LEWISBURG_SSKU_SMBUS"),
    (0xa2a3, "KABYLAKE_PCH_H_SMBUS"),
    (0xa323, "CANNONLAKE_H_SMBUS"),
    (0xa3a3, "COMETLAKE_V_SMBUS"),
    (0xae22, "METEOR_LAKE_SOC_S_SMBUS"),
    (0xe322, "PANTHER_LAKE_H_SMBUS"),
    (0xe422, "PANTHER_LAKE_P_SMBUS"),
];

pub fn smbus_name(did: u16) -> Option<&'static str> {
    PCI_ID_SMBUS_INTEL.iter().find(|(id, _)| *id == did).map(|(_, name)| *name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmbusController {
    pub bus: u8,
    pub dev: u8,
    pub fun: u8,
    pub vendor_id: u16,
    pub device_id: u16,
    /// I/O port base (BAR4, offset 0x20), LSB cleared.
    pub io_base: u16,
}

/// PCI config offsets used by the discovery predicate (spec §4.4: "class
/// code 0x0C, subclass 0x05, Intel vendor id and a DID present in a known
/// table. Validate IOSE=1, I2C_EN=0, ... and port LSB set").
const PCI_OFFSET_VENDOR_ID: u16 = 0x00;
const PCI_OFFSET_DEVICE_ID: u16 = 0x02;
const PCI_OFFSET_CLASS_CODE: u16 = 0x0B;
const PCI_OFFSET_SUBCLASS: u16 = 0x0A;
const PCI_OFFSET_HEADER_TYPE: u16 = 0x0E;
const PCI_OFFSET_BAR4: u16 = 0x20;

/// Walks `{0x00, 0x80} × dev × fun` looking for the first controller
/// matching the discovery predicate; a harmless status read probes it
/// before it is accepted (spec §4.4 "Probe with a harmless read before
/// accepting").
pub fn find_controller(kio: &dyn KernelIo) -> Result<SmbusController> {
    for bus in [0x00u8, 0x80u8] {
        for dev in 0u8..32 {
            for fun in 0u8..8 {
                let vendor_id = kio.pci_cfg_read(bus, dev, fun, PCI_OFFSET_VENDOR_ID, 2).unwrap_or(0xFFFF) as u16;
                if vendor_id == 0xFFFF || vendor_id != PCI_VENDOR_ID_INTEL {
                    continue;
                }
                let device_id = kio.pci_cfg_read(bus, dev, fun, PCI_OFFSET_DEVICE_ID, 2).unwrap_or(0xFFFF) as u16;
                if device_id == 0xFFFF || smbus_name(device_id).is_none() {
                    continue;
                }
                let header_type = kio.pci_cfg_read(bus, dev, fun, PCI_OFFSET_HEADER_TYPE, 1).unwrap_or(0xFF) as u8;
                if header_type != 0 {
                    continue;
                }
                let class_code = kio.pci_cfg_read(bus, dev, fun, PCI_OFFSET_CLASS_CODE, 1).unwrap_or(0) as u8;
                let subclass = kio.pci_cfg_read(bus, dev, fun, PCI_OFFSET_SUBCLASS, 1).unwrap_or(0) as u8;
                if class_code != PCI_CLASS_SERIAL_BUS_CONTROLLER || subclass != PCI_SUBCLASS_SMBUS {
                    continue;
                }
                let bar4 = kio.pci_cfg_read(bus, dev, fun, PCI_OFFSET_BAR4, 4).unwrap_or(0);
                if bar4 & 1 == 0 {
                    // IOSE-equivalent indicator: bit 0 set marks an I/O-space BAR.
                    continue;
                }
                let io_base = (bar4 & 0xFFFE) as u16;
                let probe = kio.port_read(u32::from(io_base) as u16, 1);
                if probe.is_err() {
                    continue;
                }
                tracing::debug!(bus, dev, fun, device_id = %format!("{device_id:#x}"), "found SMBus host controller");
                return Ok(SmbusController { bus, dev, fun, vendor_id, device_id, io_base });
            }
        }
    }
    Err(Error::ControllerNotFound)
}
