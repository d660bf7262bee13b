//! The real transport: a handle to `\\.\<driver-name>` opened with
//! `CreateFileW` and driven with `DeviceIoControl`. Gated to `cfg(windows)`
//! because the mechanism (a loadable ring-0 helper) is Intel-client-PCH and
//! Windows specific — spec §1 states this explicitly as a non-goal to
//! abstract away.

use crate::error::{classify, Error, Result};
use crate::proto::*;

/// Name of the device object the signed helper driver exposes. Overridable
/// for testing against a differently-named service.
pub const DEFAULT_DEVICE_PATH: &str = r"\\.\IMCInspectorHelper";

#[cfg(windows)]
mod sys {
    use super::*;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::ptr::{null, null_mut};
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, INVALID_HANDLE_VALUE};
    use windows_sys::Win32::Storage::FileSystem::{
        CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
    };
    use windows_sys::Win32::System::IO::DeviceIoControl;

    pub struct DriverHandle {
        handle: HANDLE,
    }

    // SAFETY: the HANDLE is only ever used through `DeviceIoControl`, which
    // is safe to call from multiple threads concurrently against the same
    // handle; serialisation of the hardware resources it fronts is done by
    // `imc-lock`, not by this handle.
    unsafe impl Send for DriverHandle {}
    unsafe impl Sync for DriverHandle {}

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    impl DriverHandle {
        pub fn open(device_path: &str) -> Result<Self> {
            let wide_path = wide(device_path);
            // SAFETY: wide_path is a valid NUL-terminated UTF-16 string; all
            // other arguments are plain integers / null per the Win32 contract
            // for opening an existing device object with no special security.
            let handle = unsafe {
                CreateFileW(
                    wide_path.as_ptr(),
                    0xC000_0000, // GENERIC_READ | GENERIC_WRITE
                    FILE_SHARE_READ | FILE_SHARE_WRITE,
                    null(),
                    OPEN_EXISTING,
                    FILE_ATTRIBUTE_NORMAL,
                    0,
                )
            };
            if handle == INVALID_HANDLE_VALUE {
                tracing::error!(error = unsafe { GetLastError() }, "failed to open kernel helper device");
                return Err(Error::DriverUnavailable);
            }
            Ok(Self { handle })
        }

        pub fn ioctl(&self, code: u32, input: &[u8], out_len: usize) -> Result<Vec<u8>> {
            let mut out = vec![0u8; out_len];
            let mut returned: u32 = 0;
            // SAFETY: `input`/`out` point at valid, appropriately sized
            // buffers for the duration of the call; `self.handle` is open.
            let ok = unsafe {
                DeviceIoControl(
                    self.handle,
                    code,
                    input.as_ptr() as *const _,
                    input.len() as u32,
                    out.as_mut_ptr() as *mut _,
                    out.len() as u32,
                    &mut returned,
                    null_mut(),
                )
            };
            if ok == 0 {
                tracing::error!(error = unsafe { GetLastError() }, code = %format!("{code:#x}"), "DeviceIoControl failed");
                return Err(Error::IoError(unsafe { GetLastError() }));
            }
            Ok(out)
        }
    }

    impl Drop for DriverHandle {
        fn drop(&mut self) {
            // SAFETY: handle was returned by a successful CreateFileW and is
            // not used again after this point.
            unsafe {
                CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(not(windows))]
mod sys {
    use super::*;

    /// The mechanism this crate wraps (`DeviceIoControl` against a loadable
    /// ring-0 helper) only exists on Windows. Off-Windows, opening always
    /// fails the way spec §4.1 says it must: fatally, for the whole snapshot.
    pub struct DriverHandle;

    impl DriverHandle {
        pub fn open(_device_path: &str) -> Result<Self> {
            Err(Error::DriverUnavailable)
        }

        pub fn ioctl(&self, _code: u32, _input: &[u8], _out_len: usize) -> Result<Vec<u8>> {
            Err(Error::DriverUnavailable)
        }
    }
}

pub use sys::DriverHandle;

impl DriverHandle {
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_DEVICE_PATH)
    }
}

impl crate::KernelIo for DriverHandle {
    fn port_read(&self, port: u16, size: u8) -> Result<u32> {
        let input = encode_port_read(port, size);
        let out = self.ioctl(FUNC_PORT_READ, &input, 8)?;
        let decoded = decode_port_read_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok(decoded.value)
    }

    fn port_write(&self, port: u16, size: u8, value: u32) -> Result<()> {
        let input = encode_port_write(port, size, value);
        let out = self.ioctl(FUNC_PORT_WRITE, &input, 4)?;
        let status = decode_status_out(&out);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(())
    }

    fn pci_cfg_read(&self, bus: u8, dev: u8, fun: u8, offset: u16, size: u8) -> Result<u32> {
        let input = encode_pci_cfg_read(bus, dev, fun, offset, size);
        let out = self.ioctl(FUNC_PCI_CFG_READ, &input, 8)?;
        let decoded = decode_pci_read_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok(decoded.value)
    }

    fn pci_cfg_write(&self, bus: u8, dev: u8, fun: u8, offset: u16, size: u8, data: u32) -> Result<()> {
        let input = encode_pci_cfg_write(bus, dev, fun, offset, size, data);
        let out = self.ioctl(FUNC_PCI_CFG_WRITE, &input, 4)?;
        let status = decode_status_out(&out);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(())
    }

    fn msr_read(&self, reg: u32) -> Result<(u32, u32)> {
        let input = encode_msr_read(reg);
        let out = self.ioctl(FUNC_MSR_READ, &input, 12)?;
        let decoded = decode_msr_read_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok((decoded.hi, decoded.lo))
    }

    fn msr_write(&self, reg: u32, hi: u32, lo: u32) -> Result<()> {
        let input = encode_msr_write(reg, hi, lo);
        let out = self.ioctl(FUNC_MSR_WRITE, &input, 4)?;
        let status = decode_status_out(&out);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(())
    }

    fn phymem_read(&self, addr: u64, size: u32) -> Result<Vec<u8>> {
        let input = encode_phymem_read(addr, size);
        let out = self.ioctl(FUNC_PHYMEM_READ, &input, size as usize + 4)?;
        let (bytes, status) = decode_phymem_read_status(&out, size as usize);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(bytes)
    }

    fn phymem_pc_read64(
        &self,
        bus: u8,
        dev: u8,
        fun: u8,
        base_cfg_offset: u16,
        addr_mask: u64,
        addr_offset: u64,
    ) -> Result<u64> {
        let input = encode_phymem_pc_read64(bus, dev, fun, base_cfg_offset, addr_mask, addr_offset);
        let out = self.ioctl(FUNC_PHYMEM_PC_READ64, &input, 12)?;
        let decoded = decode_phymem_pc_read64_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok(decoded.value)
    }

    fn phymem_pc_write32(
        &self,
        bus: u8,
        dev: u8,
        fun: u8,
        base_cfg_offset: u16,
        addr_mask: u64,
        addr_offset: u64,
        value: u32,
    ) -> Result<()> {
        let mut input = encode_phymem_pc_read64(bus, dev, fun, base_cfg_offset, addr_mask, addr_offset);
        input.extend_from_slice(&value.to_le_bytes());
        let out = self.ioctl(FUNC_PHYMEM_PC_WRITE32, &input, 4)?;
        let status = decode_status_out(&out);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(())
    }

    fn phymem_map(&self, addr: u64, size: u32) -> Result<u64> {
        let input = encode_phymem_map(addr, size);
        let out = self.ioctl(FUNC_PHYMEM_MAP, &input, 12)?;
        let decoded = decode_phymem_map_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok(decoded.virt_addr)
    }

    fn phymem_unmap(&self, addr: u64, size: u32) -> Result<()> {
        let input = encode_phymem_unmap(addr, size);
        let out = self.ioctl(FUNC_PHYMEM_UNMAP, &input, 4)?;
        let status = decode_status_out(&out);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(())
    }

    fn smbus_read_byte(&self, port: u16, dev: u8, cmd: u8) -> Result<u8> {
        let input = encode_smbus_read_byte(port, dev, cmd);
        let out = self.ioctl(FUNC_SMBUS_READ_BYTE, &input, 8)?;
        let decoded = decode_smbus_byte_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok(decoded.value)
    }

    fn smbus_write_byte(&self, port: u16, dev: u8, cmd: u8, value: u8) -> Result<()> {
        let input = encode_smbus_write_byte(port, dev, cmd, value);
        let out = self.ioctl(FUNC_SMBUS_WRITE_BYTE, &input, 4)?;
        let status = decode_status_out(&out);
        if status != 0 {
            return Err(classify(status));
        }
        Ok(())
    }

    fn smbus_proc_call(&self, port: u16, dev: u8, cmd: u8, value: u16) -> Result<u16> {
        let input = encode_smbus_proc_call(port, dev, cmd, value);
        let out = self.ioctl(FUNC_SMBUS_PROC_CALL, &input, 8)?;
        let decoded = decode_smbus_word_out(&out);
        if decoded.status != 0 {
            return Err(classify(decoded.status));
        }
        Ok(decoded.value)
    }
}
