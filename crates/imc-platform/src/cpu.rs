//! CPU identification (spec §4.5 "P first identifies the CPU"), grounded on
//! `original_source/cpuinfo.py`'s `get_cpu_id`/`get_cpu_vendor`/`get_cpu_name`
//! and `original_source/hardware.py`'s `CPUID` model-id table.
//!
//! CPUID is a local instruction, not a kernel-helper transaction — unlike
//! every other read in this crate it needs no `KernelIo` handle.

use crate::error::{Error, Result};

/// 12th-gen-family model ids (Alder Lake, Raptor Lake/-P/-S, Bartlett Lake,
/// Meteor Lake/-L): the original tool's `i12_FAM` covers 12th through 14th
/// gen under one register-map family, a grouping this crate keeps since the
/// MCHBAR layout is identical across them.
const FAMILY_12TH_GEN: &[u8] = &[0x97, 0x9A, 0xB7, 0xBA, 0xBF, 0xD7, 0xAC, 0xAA];

/// 15th-gen-family model ids (Arrow Lake/-H/-U, Lunar Lake-M, Panther Lake-L).
const FAMILY_15TH_GEN: &[u8] = &[0xC5, 0xC6, 0xB5, 0xBD, 0xCC];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuFamily {
    TwelfthGen,
    FifteenthGen,
}

/// CPU identity decoded from CPUID leaves 0/1/0x80000002-4 (spec §4.5: "vendor
/// string via CPUID leaf 0, family/extended-model via leaf 1, marketing name
/// via extended leaves 2..4").
#[derive(Debug, Clone, PartialEq)]
pub struct CpuIdentity {
    pub family: u8,
    pub model_id: u8,
    pub stepping: u8,
    pub vendor: String,
    pub marketing_name: Option<String>,
}

impl CpuIdentity {
    /// Buckets `model_id` into the 12th- or 15th-gen register-map family
    /// (spec §4.5: "a static set categorises the model ... unknown CPUs are
    /// rejected").
    pub fn family_bucket(&self) -> Result<CpuFamily> {
        if FAMILY_12TH_GEN.contains(&self.model_id) {
            Ok(CpuFamily::TwelfthGen)
        } else if FAMILY_15TH_GEN.contains(&self.model_id) {
            Ok(CpuFamily::FifteenthGen)
        } else {
            Err(Error::Unsupported(self.model_id))
        }
    }
}

#[cfg(target_arch = "x86_64")]
mod raw {
    use std::arch::x86_64::{__cpuid, __cpuid_count};

    pub fn leaf(eax: u32) -> (u32, u32, u32, u32) {
        // SAFETY: CPUID is available on every x86-64 CPU this tool targets;
        // `__cpuid` issues it with ecx=0.
        let r = unsafe { __cpuid(eax) };
        (r.eax, r.ebx, r.ecx, r.edx)
    }

    #[allow(dead_code)]
    pub fn leaf_sub(eax: u32, ecx: u32) -> (u32, u32, u32, u32) {
        // SAFETY: see `leaf`; `__cpuid_count` additionally sets ecx.
        let r = unsafe { __cpuid_count(eax, ecx) };
        (r.eax, r.ebx, r.ecx, r.edx)
    }
}

fn regs_to_ascii(regs: &[u32]) -> String {
    let mut bytes = Vec::with_capacity(regs.len() * 4);
    for r in regs {
        bytes.extend_from_slice(&r.to_le_bytes());
    }
    let s = String::from_utf8_lossy(&bytes).into_owned();
    s.split('\0').next().unwrap_or("").to_string()
}

/// Reads and decodes the running CPU's identity. Returns
/// `Err(Error::Unsupported(0))` on non-x86-64 hosts, since CPUID itself is
/// unavailable there.
#[cfg(target_arch = "x86_64")]
pub fn identify() -> Result<CpuIdentity> {
    let (_, ebx, ecx, edx) = raw::leaf(0);
    let vendor = regs_to_ascii(&[ebx, edx, ecx]);

    let (eax1, ..) = raw::leaf(1);
    let stepping = (eax1 & 0xF) as u8;
    let model = ((eax1 >> 4) & 0xF) as u8;
    let family = ((eax1 >> 8) & 0xF) as u8;
    let ext_model = ((eax1 >> 16) & 0xF) as u8;
    let ext_family = ((eax1 >> 20) & 0xFF) as u8;

    let cpu_family = if family != 0xF { family } else { family.wrapping_add(ext_family) };
    let cpu_model = if family != 0x6 && family != 0xF { model } else { model | (ext_model << 4) };

    let mut name = String::new();
    for leaf_id in 0x8000_0002u32..=0x8000_0004 {
        let (a, b, c, d) = raw::leaf(leaf_id);
        name.push_str(&regs_to_ascii(&[a, b, c, d]));
    }
    let marketing_name = {
        let trimmed = name.replace("(R)", "").replace("(TM)", "").replace("  ", " ");
        let trimmed = trimmed.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    };

    Ok(CpuIdentity { family: cpu_family, model_id: cpu_model, stepping, vendor, marketing_name })
}

#[cfg(not(target_arch = "x86_64"))]
pub fn identify() -> Result<CpuIdentity> {
    Err(Error::Unsupported(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_ids_bucket_correctly() {
        let alder = CpuIdentity { family: 6, model_id: 0x97, stepping: 0, vendor: "GenuineIntel".into(), marketing_name: None };
        assert_eq!(alder.family_bucket(), Ok(CpuFamily::TwelfthGen));

        let arrow = CpuIdentity { family: 6, model_id: 0xC6, stepping: 0, vendor: "GenuineIntel".into(), marketing_name: None };
        assert_eq!(arrow.family_bucket(), Ok(CpuFamily::FifteenthGen));
    }

    #[test]
    fn unknown_model_id_is_rejected() {
        let unknown = CpuIdentity { family: 6, model_id: 0x00, stepping: 0, vendor: "GenuineIntel".into(), marketing_name: None };
        assert_eq!(unknown.family_bucket(), Err(Error::Unsupported(0x00)));
    }
}
