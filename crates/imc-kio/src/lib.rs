//! Kernel-helper transport (component K, spec §4.1).
//!
//! A uniform operation set over a signed ring-0 driver: port I/O, PCI
//! configuration space, MSRs, physical memory and MMIO-via-PCI-BAR. Every
//! request is encoded as a fixed-layout little-endian input record and
//! decoded from a fixed-size output record (see [`proto`]); a device-control
//! code is computed with [`proto::ctl_code`]. K has no knowledge of what the
//! registers mean — that belongs to the decoder (`imc-decode`) and the
//! platform walker (`imc-platform`).

mod error;
pub mod proto;
mod windows_driver;

pub use error::{Error, Result};

/// The operation set every caller above K programs against. Implemented by
/// [`windows_driver::DriverHandle`] against the real device, and by a fake in
/// `imc-testing` for tests that run on any host.
pub trait KernelIo: Send + Sync {
    fn port_read(&self, port: u16, size: u8) -> Result<u32>;
    fn port_write(&self, port: u16, size: u8, value: u32) -> Result<()>;

    fn pci_cfg_read(&self, bus: u8, dev: u8, fun: u8, offset: u16, size: u8) -> Result<u32>;
    fn pci_cfg_write(&self, bus: u8, dev: u8, fun: u8, offset: u16, size: u8, data: u32) -> Result<()>;

    /// Returns `(hi, lo)` per spec §4.1.
    fn msr_read(&self, reg: u32) -> Result<(u32, u32)>;
    fn msr_write(&self, reg: u32, hi: u32, lo: u32) -> Result<()>;

    fn phymem_read(&self, addr: u64, size: u32) -> Result<Vec<u8>>;

    fn phymem_pc_read64(
        &self,
        bus: u8,
        dev: u8,
        fun: u8,
        base_cfg_offset: u16,
        addr_mask: u64,
        addr_offset: u64,
    ) -> Result<u64>;

    fn phymem_pc_write32(
        &self,
        bus: u8,
        dev: u8,
        fun: u8,
        base_cfg_offset: u16,
        addr_mask: u64,
        addr_offset: u64,
        value: u32,
    ) -> Result<()>;

    fn phymem_map(&self, addr: u64, size: u32) -> Result<u64>;
    fn phymem_unmap(&self, addr: u64, size: u32) -> Result<()>;

    /// Method A SMBus "smart" IOCTLs (spec §4.4). Returns `Err(Unsupported)`
    /// when the driver build does not implement them; the SMBus engine then
    /// falls back to Method B port sequencing.
    fn smbus_read_byte(&self, port: u16, dev: u8, cmd: u8) -> Result<u8>;
    fn smbus_write_byte(&self, port: u16, dev: u8, cmd: u8, value: u8) -> Result<()>;
    fn smbus_proc_call(&self, port: u16, dev: u8, cmd: u8, value: u16) -> Result<u16>;
}

pub use windows_driver::DriverHandle;
