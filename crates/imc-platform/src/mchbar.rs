//! MCHBAR/DMIBAR base discovery (spec §4.5, grounded on
//! `original_source/memory.py`'s `get_mem_ctrl`: `pci_cfg_read(0, 0, 0, 0x48,
//! '4')`, bit 0 the BAR enable flag, sanity floor `0xFE000000`).

use imc_kio::KernelIo;

use crate::error::{Error, Result};

const HOST_BRIDGE_BUS: u8 = 0;
const HOST_BRIDGE_DEV: u8 = 0;
const HOST_BRIDGE_FUN: u8 = 0;
const MCHBAR_CFG_OFFSET: u16 = 0x48;
const DMIBAR_CFG_OFFSET: u16 = 0x68;
const MCHBAR_MIN: u64 = 0xFE00_0000;
const CONTROLLER_SPACING: u64 = 0x1_0000;

/// `MCHBAR_BASE + 0x10000 * controller`, per controller (spec §4.5:
/// "controller spacing: 0x10000").
pub fn mchbar_base(kio: &dyn KernelIo, controller: u8) -> Result<u64> {
    let lo = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, MCHBAR_CFG_OFFSET, 4)?;
    let hi = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, MCHBAR_CFG_OFFSET + 4, 4)?;
    let raw = (u64::from(hi) << 32) | u64::from(lo);

    if raw & 1 != 1 {
        return Err(Error::MchbarUnavailable(lo));
    }
    let base = raw & !1u64;
    if base < MCHBAR_MIN {
        return Err(Error::MchbarUnavailable(lo));
    }
    Ok(base + CONTROLLER_SPACING * u64::from(controller))
}

/// DMIBAR is optional (spec §4.5): absent/invalid is not fatal, callers that
/// need it degrade the dependent field rather than the whole snapshot.
pub fn dmibar_base(kio: &dyn KernelIo) -> Option<u64> {
    let lo = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, DMIBAR_CFG_OFFSET, 4).ok()?;
    let hi = kio.pci_cfg_read(HOST_BRIDGE_BUS, HOST_BRIDGE_DEV, HOST_BRIDGE_FUN, DMIBAR_CFG_OFFSET + 4, 4).ok()?;
    let raw = (u64::from(hi) << 32) | u64::from(lo);
    if raw & 1 != 1 || raw < MCHBAR_MIN {
        return None;
    }
    let base = raw & !1u64;

    // Sanity check: DMIBAR[0..4] should read back the Intel vendor word.
    let probe = kio.phymem_read(base, 4).ok()?;
    if probe.len() != 4 {
        return None;
    }
    let vendor = u16::from_le_bytes([probe[0], probe[1]]);
    if vendor != 0x8086 {
        return None;
    }
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeKio {
        pci: Mutex<HashMap<(u8, u8, u8, u16), u32>>,
    }

    impl KernelIo for FakeKio {
        fn port_read(&self, _: u16, _: u8) -> imc_kio::Result<u32> { unimplemented!() }
        fn port_write(&self, _: u16, _: u8, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn pci_cfg_read(&self, bus: u8, dev: u8, fun: u8, offset: u16, _size: u8) -> imc_kio::Result<u32> {
            Ok(*self.pci.lock().unwrap().get(&(bus, dev, fun, offset)).unwrap_or(&0))
        }
        fn pci_cfg_write(&self, _: u8, _: u8, _: u8, _: u16, _: u8, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn msr_read(&self, _: u32) -> imc_kio::Result<(u32, u32)> { unimplemented!() }
        fn msr_write(&self, _: u32, _: u32, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn phymem_read(&self, _: u64, _: u32) -> imc_kio::Result<Vec<u8>> { unimplemented!() }
        fn phymem_pc_read64(&self, _: u8, _: u8, _: u8, _: u16, _: u64, _: u64) -> imc_kio::Result<u64> { unimplemented!() }
        fn phymem_pc_write32(&self, _: u8, _: u8, _: u8, _: u16, _: u64, _: u64, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn phymem_map(&self, _: u64, _: u32) -> imc_kio::Result<u64> { unimplemented!() }
        fn phymem_unmap(&self, _: u64, _: u32) -> imc_kio::Result<()> { unimplemented!() }
        fn smbus_read_byte(&self, _: u16, _: u8, _: u8) -> imc_kio::Result<u8> { unimplemented!() }
        fn smbus_write_byte(&self, _: u16, _: u8, _: u8, _: u8) -> imc_kio::Result<()> { unimplemented!() }
        fn smbus_proc_call(&self, _: u16, _: u8, _: u8, _: u16) -> imc_kio::Result<u16> { unimplemented!() }
    }

    #[test]
    fn rejects_disabled_bar() {
        let mut pci = HashMap::new();
        pci.insert((0, 0, 0, MCHBAR_CFG_OFFSET), 0xFE00_0000u32); // bit 0 clear
        let kio = FakeKio { pci: Mutex::new(pci) };
        assert!(matches!(mchbar_base(&kio, 0), Err(Error::MchbarUnavailable(_))));
    }

    #[test]
    fn accepts_enabled_bar_and_adds_controller_spacing() {
        let mut pci = HashMap::new();
        pci.insert((0, 0, 0, MCHBAR_CFG_OFFSET), 0xFE00_0001u32);
        let kio = FakeKio { pci: Mutex::new(pci) };
        assert_eq!(mchbar_base(&kio, 0).unwrap(), 0xFE00_0000);
        assert_eq!(mchbar_base(&kio, 1).unwrap(), 0xFE01_0000);
    }
}
