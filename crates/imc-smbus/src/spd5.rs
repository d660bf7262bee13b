//! SPD5 hub driver (spec §4.4, grounded on `original_source/memspd.py`'s
//! `_mem_spd_read_byte`/`mem_spd_read_reg` and the SPD5 hub register set).
//!
//! The SPD address space is 8 pages of 128 bytes each (1024 bytes total).
//! Page selection goes through MR11; a write-protected MR11 degrades the
//! slot to a page-0-only, 128-byte dump rather than failing the whole slot.

use crate::error::{Error, Result};
use crate::method::SmbusMethod;

/// Typical base I2C address for the first SPD5 hub; slot index is added.
pub const SMBUS_SPD_ADDRESS: u8 = 0x50;

pub const SPD5_MR3: u8 = 0x03; // Vendor ID, two bytes (MR3 low, MR4 high)
pub const SPD5_MR11: u8 = 0x0B; // I2C Legacy Mode Device Configuration (page select)
pub const SPD5_MR18: u8 = 0x12; // Device Configuration
pub const SPD5_MR48: u8 = 0x30; // Device Status
pub const SPD5_MR49: u8 = 0x31; // TS Current Sensed Temperature, two bytes (MR49 low, MR50 high)

const MR48_IBI_PENDING: u8 = 0x08;
const PAGE_SIZE: usize = 0x80;
const PAGE_COUNT: usize = 8;
pub const FULL_DUMP_LEN: usize = PAGE_SIZE * PAGE_COUNT;

pub struct Spd5Hub<'a, M: SmbusMethod + ?Sized> {
    method: &'a M,
    port: u16,
    dev_addr: u8,
}

impl<'a, M: SmbusMethod + ?Sized> Spd5Hub<'a, M> {
    pub fn new(method: &'a M, port: u16, slot: u8) -> Self {
        Self { method, port, dev_addr: SMBUS_SPD_ADDRESS + slot }
    }

    fn select_page(&self, page: u8) -> Result<bool> {
        let packed = (page & 0x07) << 3;
        if self
            .method
            .proc_call(self.port, self.dev_addr, SPD5_MR11, u16::from(packed))
            .is_ok()
        {
            self.gate_on_mr48()?;
            return Ok(false);
        }
        match self.method.write_byte(self.port, self.dev_addr, SPD5_MR11, packed) {
            Ok(()) => {
                self.gate_on_mr48()?;
                Ok(false)
            }
            Err(_) => Ok(true),
        }
    }

    fn gate_on_mr48(&self) -> Result<()> {
        let status = self.method.read_byte(self.port, self.dev_addr, SPD5_MR48)?;
        let _ = status & !MR48_IBI_PENDING;
        Ok(())
    }

    fn read_in_page(&self, offset_in_page: u8) -> Result<u8> {
        self.method.read_byte(self.port, self.dev_addr, offset_in_page | 0x80)
    }

    /// Reads one absolute byte offset, selecting the owning page first.
    pub fn read_byte(&self, offset: u16) -> Result<u8> {
        let page = (offset / PAGE_SIZE as u16) as u8;
        let in_page = (offset % PAGE_SIZE as u16) as u8;
        if self.select_page(page)? {
            return Err(Error::PageProtected);
        }
        self.read_in_page(in_page)
    }

    pub fn read_word_reg(&self, reg: u8) -> Result<u16> {
        let lo = self.method.read_byte(self.port, self.dev_addr, reg)?;
        let hi = self.method.read_byte(self.port, self.dev_addr, reg + 1)?;
        Ok((u16::from(hi) << 8) | u16::from(lo))
    }

    /// SPD5 vendor id (MR3 low byte, MR4 high byte per the datasheet's
    /// "MR3/MR4" pairing) as a raw JEP-106 field (spec §3 "DIMM[k].SPD vendor").
    pub fn vendor_id(&self) -> Result<u16> {
        self.read_word_reg(SPD5_MR3)
    }

    /// Current sensed temperature (spec §4.4 "a temperature-sensor reader
    /// (MR49/MR50 thermal register)"), 13-bit signed fixed-point in quarter
    /// degrees Celsius (spec §4.3: "temperature (13-bit signed /4)").
    pub fn temperature_celsius(&self) -> Result<f64> {
        let raw = self.read_word_reg(SPD5_MR49)?;
        Ok(imc_decode::fixed(u64::from(raw & 0x1FFF), 2, Some(13)))
    }

    /// Full 1024-byte dump, or a short (128-byte, page-0-only) dump if MR11
    /// is write-protected (spec §8 scenario 3: "first PROC_CALL fails
    /// cleanly; fallback write_byte(MR11) also fails; slot is marked
    /// is_page_protected=true; spd_eeprom is 128 bytes (page 0 only)").
    ///
    /// A page-select failure is page-protection, not absence: the device
    /// already sits on page 0 at power-up, so this still attempts the raw
    /// page-0 byte reads instead of returning nothing. `is_page_protected`
    /// is set on *any* select failure, including page 0's, since a refused
    /// MR11 write is the page-protected condition regardless of which page
    /// was being switched to.
    pub fn dump(&self) -> (Vec<u8>, bool) {
        let mut out = Vec::with_capacity(FULL_DUMP_LEN);
        for page in 0u8..PAGE_COUNT as u8 {
            if self.select_page(page).unwrap_or(true) {
                if page == 0 {
                    for in_page in 0u8..PAGE_SIZE as u8 {
                        match self.read_in_page(in_page) {
                            Ok(b) => out.push(b),
                            Err(_) => break,
                        }
                    }
                }
                return (out, true);
            }
            for in_page in 0u8..PAGE_SIZE as u8 {
                match self.read_in_page(in_page) {
                    Ok(b) => out.push(b),
                    Err(_) => return (out, false),
                }
            }
        }
        (out, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_length_is_multiple_of_page_size_and_bounded() {
        assert_eq!(FULL_DUMP_LEN, 1024);
        assert_eq!(FULL_DUMP_LEN % PAGE_SIZE, 0);
    }

    /// Both PROC_CALL and the write_byte(MR11) fallback refused (spec §8
    /// scenario 3): `dump()` must still return the 128 page-0 bytes, with
    /// `is_page_protected = true`, instead of an empty, unprotected dump.
    struct ProtectedMr11;

    impl SmbusMethod for ProtectedMr11 {
        fn read_byte(&self, _port: u16, _dev: u8, cmd: u8) -> Result<u8> {
            Ok(cmd & 0x7F)
        }

        fn write_byte(&self, _port: u16, _dev: u8, _cmd: u8, _value: u8) -> Result<()> {
            Err(Error::Timeout)
        }

        fn proc_call(&self, _port: u16, _dev: u8, _cmd: u8, _value: u16) -> Result<u16> {
            Err(Error::Timeout)
        }
    }

    #[test]
    fn dump_falls_back_to_page_zero_when_mr11_is_write_protected() {
        let hub = Spd5Hub::new(&ProtectedMr11, 0x6000, 0);
        let (data, page_protected) = hub.dump();
        assert_eq!(data.len(), PAGE_SIZE);
        assert!(page_protected);
        assert_eq!(data[5], 5);
    }
}
