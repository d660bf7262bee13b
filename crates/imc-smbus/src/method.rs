//! The two SMBus transport methods of spec §4.4 as a strategy interface with
//! two implementations, selected per-controller at construction (design
//! note §9: "Method 0 vs method 1" forks become a strategy interface).

use imc_kio::KernelIo;

use crate::error::{Error, Result};
use crate::i801::*;

/// One SMBus host-controller transaction kind (`SMBHSTCNT[4:2]`, spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xact {
    Quick,
    Byte,
    ByteData,
    WordData,
    ProcCall,
    BlockData,
    I2cBlockData,
}

impl Xact {
    fn cnt_bits(self) -> u8 {
        match self {
            Xact::Quick => SMBHSTCNT_QUICK,
            Xact::Byte => SMBHSTCNT_BYTE,
            Xact::ByteData => SMBHSTCNT_BYTE_DATA,
            Xact::WordData => SMBHSTCNT_WORD_DATA,
            Xact::ProcCall => SMBHSTCNT_PROC_CALL,
            Xact::BlockData => SMBHSTCNT_BLOCK_DATA,
            Xact::I2cBlockData => SMBHSTCNT_I2C_BLOCK_DATA,
        }
    }
}

/// Transport strategy: given a prepared transaction, exchange bytes with
/// the SMBus slave at `dev`. Implementations hide whether that happens via
/// driver "smart" IOCTLs or raw i801 port sequencing.
pub trait SmbusMethod {
    fn read_byte(&self, port: u16, dev: u8, cmd: u8) -> Result<u8>;
    fn write_byte(&self, port: u16, dev: u8, cmd: u8, value: u8) -> Result<()>;
    /// SMBus "process call": write a word, read a word back in the same
    /// transaction. Used for SPD5 page selection because it survives
    /// BIOS write-protection that blocks a plain byte write (spec §4.4).
    fn proc_call(&self, port: u16, dev: u8, cmd: u8, value: u16) -> Result<u16>;
}

/// Method A: the kernel helper's "smart" IOCTLs do the port sequencing in
/// the driver; no port-level bit twiddling here at all.
pub struct DriverMethod<'a> {
    pub kio: &'a dyn KernelIo,
}

impl<'a> SmbusMethod for DriverMethod<'a> {
    fn read_byte(&self, port: u16, dev: u8, cmd: u8) -> Result<u8> {
        Ok(self.kio.smbus_read_byte(port, dev, cmd)?)
    }

    fn write_byte(&self, port: u16, dev: u8, cmd: u8, value: u8) -> Result<()> {
        Ok(self.kio.smbus_write_byte(port, dev, cmd, value)?)
    }

    fn proc_call(&self, port: u16, dev: u8, cmd: u8, value: u16) -> Result<u16> {
        Ok(self.kio.smbus_proc_call(port, dev, cmd, value)?)
    }
}

/// Method B: raw i801 register sequencing over port I/O (spec §4.4,
/// grounded on `original_source/memspd.py`'s `_smbus_process` /
/// `_smbus_read_byte` / `_mem_spd_read_byte`).
pub struct PortMethod<'a> {
    pub kio: &'a dyn KernelIo,
}

impl<'a> PortMethod<'a> {
    fn port8_read(&self, base: u16, reg: u16) -> Result<u8> {
        Ok(self.kio.port_read(base + reg, 1)? as u8)
    }

    fn port8_write(&self, base: u16, reg: u16, value: u8) -> Result<()> {
        Ok(self.kio.port_write(base + reg, 1, u32::from(value))?)
    }

    /// Clears stale status, arms `xact`, starts the transaction, and polls
    /// `HOST_BUSY` under a 100 × 0.5 ms budget — the raw-port equivalent of
    /// `mutex_wait_timeout`/`inuse_timeout` bookkeeping the spec assigns to
    /// `imc-lock`; this loop only guards the single hardware transaction.
    fn run(&self, base: u16, xact: Xact) -> Result<()> {
        let pending = self.port8_read(base, SMBHSTSTS)?;
        if pending & 0x1F != 0 {
            self.port8_write(base, SMBHSTSTS, pending & 0x1F)?;
            let status = self.port8_read(base, SMBHSTSTS)?;
            if status & 0x1F != 0 {
                return Err(Error::BusError(status));
            }
        }

        self.port8_write(base, SMBHSTCNT, xact.cnt_bits() | SMBHSTCNT_START)?;

        let mut polls = 0;
        let status = loop {
            let status = self.port8_read(base, SMBHSTSTS)?;
            if status & SMBHSTSTS_HOST_BUSY == 0 {
                break status;
            }
            polls += 1;
            if polls >= 100 {
                return Err(Error::Timeout);
            }
            std::thread::yield_now();
        };

        if status & (SMBHSTSTS_FAILED | SMBHSTSTS_BUS_ERR | SMBHSTSTS_DEV_ERR) != 0 {
            return Err(Error::BusError(status));
        }

        let leftover = self.port8_read(base, SMBHSTSTS)?;
        if leftover & 0x1F != 0 {
            self.port8_write(base, SMBHSTSTS, leftover)?;
        }
        Ok(())
    }
}

impl<'a> SmbusMethod for PortMethod<'a> {
    fn read_byte(&self, port: u16, dev: u8, cmd: u8) -> Result<u8> {
        self.port8_write(port, SMBHSTADD, (dev << 1) | I2C_READ)?;
        self.port8_write(port, SMBHSTCMD, cmd)?;
        self.run(port, Xact::ByteData)?;
        self.port8_read(port, SMBHSTDAT0)
    }

    fn write_byte(&self, port: u16, dev: u8, cmd: u8, value: u8) -> Result<()> {
        self.port8_write(port, SMBHSTADD, (dev << 1) | I2C_WRITE)?;
        self.port8_write(port, SMBHSTCMD, cmd)?;
        self.port8_write(port, SMBHSTDAT0, value)?;
        self.run(port, Xact::ByteData)
    }

    fn proc_call(&self, port: u16, dev: u8, cmd: u8, value: u16) -> Result<u16> {
        self.port8_write(port, SMBHSTADD, (dev << 1) | I2C_WRITE)?;
        self.port8_write(port, SMBHSTCMD, cmd)?;
        self.port8_write(port, SMBHSTDAT0, (value & 0xFF) as u8)?;
        self.port8_write(port, SMBHSTDAT1, (value >> 8) as u8)?;
        self.run(port, Xact::ProcCall)?;
        let lo = self.port8_read(port, SMBHSTDAT0)?;
        let hi = self.port8_read(port, SMBHSTDAT1)?;
        Ok((u16::from(hi) << 8) | u16::from(lo))
    }
}
