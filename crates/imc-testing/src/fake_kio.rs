//! In-memory [`imc_kio::KernelIo`] double (spec `SPEC_FULL.md` §F), backed by
//! the exact three maps the spec names: PCI config space keyed by
//! `(bus, dev, fun, offset)`, MSRs keyed by register number, and a
//! sparse physical-memory byte image addressable by offset.
//!
//! CPUID is a local instruction (see `imc_platform::cpu`), not a `KernelIo`
//! call, so this fixture cannot steer `imc_platform::identify`'s CPU
//! identity — tests exercise the MCHBAR/inter-channel/capability/register-map
//! layers individually instead of the full `identify()`/`refresh()` path.

use std::collections::HashMap;
use std::sync::Mutex;

use imc_kio::{Error, KernelIo, Result};

#[derive(Default)]
pub struct FakeKio {
    pci: Mutex<HashMap<(u8, u8, u8, u16), u32>>,
    msr: Mutex<HashMap<u32, (u32, u32)>>,
    phymem: Mutex<HashMap<u64, u8>>,
    ports: Mutex<HashMap<u16, u32>>,
    smbus_smart: Mutex<HashMap<(u16, u8, u8), u8>>,
    /// When `false`, every `smbus_*` call returns `Err(Unsupported)`, forcing
    /// callers onto the raw port-sequencing method (spec §4.4's Method B).
    smbus_smart_supported: Mutex<bool>,
}

impl FakeKio {
    pub fn new() -> Self {
        Self { smbus_smart_supported: Mutex::new(true), ..Default::default() }
    }

    pub fn with_pci(self, bus: u8, dev: u8, fun: u8, offset: u16, value: u32) -> Self {
        self.pci.lock().unwrap().insert((bus, dev, fun, offset), value);
        self
    }

    pub fn with_msr(self, reg: u32, hi: u32, lo: u32) -> Self {
        self.msr.lock().unwrap().insert(reg, (hi, lo));
        self
    }

    pub fn with_port(self, port: u16, value: u32) -> Self {
        self.ports.lock().unwrap().insert(port, value);
        self
    }

    /// Writes `bytes` starting at `base`, for `phymem_read` to later serve.
    pub fn with_phymem_block(self, base: u64, bytes: &[u8]) -> Self {
        let mut mem = self.phymem.lock().unwrap();
        for (i, b) in bytes.iter().enumerate() {
            mem.insert(base + i as u64, *b);
        }
        drop(mem);
        self
    }

    pub fn with_smbus_smart_disabled(self) -> Self {
        *self.smbus_smart_supported.lock().unwrap() = false;
        self
    }

    pub fn with_smbus_byte(self, port: u16, dev: u8, cmd: u8, value: u8) -> Self {
        self.smbus_smart.lock().unwrap().insert((port, dev, cmd), value);
        self
    }
}

impl KernelIo for FakeKio {
    fn port_read(&self, port: u16, size: u8) -> Result<u32> {
        let v = self.ports.lock().unwrap().get(&port).copied().unwrap_or(0);
        Ok(v & size_mask(size))
    }

    fn port_write(&self, port: u16, size: u8, value: u32) -> Result<()> {
        self.ports.lock().unwrap().insert(port, value & size_mask(size));
        Ok(())
    }

    fn pci_cfg_read(&self, bus: u8, dev: u8, fun: u8, offset: u16, size: u8) -> Result<u32> {
        let v = self.pci.lock().unwrap().get(&(bus, dev, fun, offset)).copied().unwrap_or(0);
        Ok(v & size_mask(size))
    }

    fn pci_cfg_write(&self, bus: u8, dev: u8, fun: u8, offset: u16, size: u8, data: u32) -> Result<()> {
        self.pci.lock().unwrap().insert((bus, dev, fun, offset), data & size_mask(size));
        Ok(())
    }

    fn msr_read(&self, reg: u32) -> Result<(u32, u32)> {
        Ok(self.msr.lock().unwrap().get(&reg).copied().unwrap_or((0, 0)))
    }

    fn msr_write(&self, reg: u32, hi: u32, lo: u32) -> Result<()> {
        self.msr.lock().unwrap().insert(reg, (hi, lo));
        Ok(())
    }

    fn phymem_read(&self, addr: u64, size: u32) -> Result<Vec<u8>> {
        let mem = self.phymem.lock().unwrap();
        Ok((0..u64::from(size)).map(|i| mem.get(&(addr + i)).copied().unwrap_or(0)).collect())
    }

    fn phymem_pc_read64(&self, bus: u8, dev: u8, fun: u8, base_cfg_offset: u16, addr_mask: u64, addr_offset: u64) -> Result<u64> {
        let lo = self.pci_cfg_read(bus, dev, fun, base_cfg_offset, 4)?;
        let hi = self.pci_cfg_read(bus, dev, fun, base_cfg_offset + 4, 4)?;
        let raw = (u64::from(hi) << 32) | u64::from(lo);
        Ok((raw & addr_mask) + addr_offset)
    }

    fn phymem_pc_write32(&self, bus: u8, dev: u8, fun: u8, base_cfg_offset: u16, _addr_mask: u64, _addr_offset: u64, value: u32) -> Result<()> {
        self.pci_cfg_write(bus, dev, fun, base_cfg_offset, 4, value)
    }

    fn phymem_map(&self, addr: u64, _size: u32) -> Result<u64> {
        Ok(addr)
    }

    fn phymem_unmap(&self, _addr: u64, _size: u32) -> Result<()> {
        Ok(())
    }

    fn smbus_read_byte(&self, port: u16, dev: u8, cmd: u8) -> Result<u8> {
        if !*self.smbus_smart_supported.lock().unwrap() {
            return Err(Error::Unsupported);
        }
        Ok(self.smbus_smart.lock().unwrap().get(&(port, dev, cmd)).copied().unwrap_or(0))
    }

    fn smbus_write_byte(&self, port: u16, dev: u8, cmd: u8, value: u8) -> Result<()> {
        if !*self.smbus_smart_supported.lock().unwrap() {
            return Err(Error::Unsupported);
        }
        self.smbus_smart.lock().unwrap().insert((port, dev, cmd), value);
        Ok(())
    }

    fn smbus_proc_call(&self, port: u16, dev: u8, cmd: u8, value: u16) -> Result<u16> {
        if !*self.smbus_smart_supported.lock().unwrap() {
            return Err(Error::Unsupported);
        }
        self.smbus_write_byte(port, dev, cmd, (value & 0xFF) as u8)?;
        Ok(value)
    }
}

fn size_mask(size: u8) -> u32 {
    match size {
        1 => 0xFF,
        2 => 0xFFFF,
        _ => 0xFFFF_FFFF,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pci_read_defaults_to_zero_and_respects_size_mask() {
        let kio = FakeKio::new().with_pci(0, 0, 0, 0x48, 0xFFFF_FFFF);
        assert_eq!(kio.pci_cfg_read(0, 0, 0, 0x48, 1).unwrap(), 0xFF);
        assert_eq!(kio.pci_cfg_read(0, 0, 0, 0x4C, 4).unwrap(), 0);
    }

    #[test]
    fn phymem_read_serves_inserted_block_and_zero_fills_the_rest() {
        let kio = FakeKio::new().with_phymem_block(0x1000, &[1, 2, 3]);
        assert_eq!(kio.phymem_read(0x1000, 5).unwrap(), vec![1, 2, 3, 0, 0]);
    }

    #[test]
    fn smbus_disabled_forces_unsupported() {
        let kio = FakeKio::new().with_smbus_smart_disabled();
        assert_eq!(kio.smbus_read_byte(0x1000, 0x50, 0).unwrap_err(), Error::Unsupported);
    }
}
