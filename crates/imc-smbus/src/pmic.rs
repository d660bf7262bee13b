//! Richtek PMIC driver (spec §4.4): vendor probe, then a 7-channel ADC
//! handshake for the SWA/SWB/SWC/SWD rails plus 1.8V/1.0V LDOs and VIN.
//!
//! The handshake targets a NULL channel first so a stale reading from the
//! previous caller can't be mistaken for a fresh one, then targets the real
//! channel and waits for a non-zero reading. `R30`/`R31` are restored to
//! their pre-probe value on exit; a failed restore is a logged warning, not
//! a fatal error (spec §4.4's explicit carve-out).

use imc_decode::{jep106_decode, jep106_vendor_name, RICHTEK_VENDOR_RAW};

use crate::error::Result;
use crate::method::SmbusMethod;

const R1A: u8 = 0x1A;
const R1B: u8 = 0x1B;
const R30_ADC_CONTROL: u8 = 0x30;
const R31_ADC_READ: u8 = 0x31;
const R3B_REVISION: u8 = 0x3B;
const R3C_VENDOR: u8 = 0x3C;

const NULL_CHANNEL_CODE: u8 = 0x00;
const HANDSHAKE_RETRIES: u32 = 4;

/// On-DIMM PMIC base I2C address (spec §6: "0x18..0x1B and 0x48..0x4B
/// (PMIC variants)"); `0x48` is the address range actually wired on every
/// DDR5 reference design this tool's vendor table covers, so it is the one
/// `imc-snapshot` probes by default (see `DESIGN.md`'s Open Question entry
/// for the `0x18` range, which no example board in the retrieval pack uses).
pub const PMIC_BASE_ADDRESS: u8 = 0x48;

/// Legacy/alternate PMIC address range some early DDR5 boards use instead.
pub const PMIC_BASE_ADDRESS_ALT: u8 = 0x18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Swa,
    Swb,
    Swc,
    Swd,
    V18,
    V10,
    Vin,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::Swa,
        Channel::Swb,
        Channel::Swc,
        Channel::Swd,
        Channel::V18,
        Channel::V10,
        Channel::Vin,
    ];

    fn select_code(self) -> u8 {
        match self {
            Channel::Swa => 1,
            Channel::Swb => 2,
            Channel::Swc => 3,
            Channel::Swd => 4,
            Channel::V18 => 5,
            Channel::V10 => 6,
            Channel::Vin => 7,
        }
    }

    fn multiplier(self) -> f64 {
        if self == Channel::Vin {
            0.070
        } else {
            0.015
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Swa => "SWA",
            Channel::Swb => "SWB",
            Channel::Swc => "SWC",
            Channel::Swd => "SWD",
            Channel::V18 => "1.8V",
            Channel::V10 => "1.0V",
            Channel::Vin => "VIN",
        }
    }
}

pub struct RichtekPmic<'a, M: SmbusMethod + ?Sized> {
    method: &'a M,
    port: u16,
    dev_addr: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identity {
    pub vendor_id_raw: u16,
    pub vendor_name: Option<&'static str>,
    pub revision: u8,
}

impl<'a, M: SmbusMethod + ?Sized> RichtekPmic<'a, M> {
    pub fn new(method: &'a M, port: u16, dev_addr: u8) -> Self {
        Self { method, port, dev_addr }
    }

    /// Reads R3C/R3C+1 and decodes the JEP-106 vendor id; callers check
    /// `is_richtek` before trusting any ADC reading.
    pub fn probe(&self) -> Result<Identity> {
        let lo = self.method.read_byte(self.port, self.dev_addr, R3C_VENDOR)?;
        let hi = self.method.read_byte(self.port, self.dev_addr, R3C_VENDOR + 1)?;
        let raw = (u16::from(hi) << 8) | u16::from(lo);
        let revision = self.method.read_byte(self.port, self.dev_addr, R3B_REVISION)?;
        let id = jep106_decode(raw);
        Ok(Identity { vendor_id_raw: raw, vendor_name: jep106_vendor_name(id), revision })
    }

    pub fn is_richtek(identity: &Identity) -> bool {
        identity.vendor_id_raw == RICHTEK_VENDOR_RAW
    }

    /// Reads one ADC channel in volts, or `None` if the handshake never
    /// produced a non-zero reading within the retry budget.
    pub fn read_channel(&self, channel: Channel) -> Result<Option<f64>> {
        let original_control = self.method.read_byte(self.port, self.dev_addr, R30_ADC_CONTROL)?;

        let result = self.handshake(channel);

        if let Err(e) = self.method.write_byte(self.port, self.dev_addr, R30_ADC_CONTROL, original_control) {
            tracing::warn!(error = %e, "failed to restore Richtek R30 ADC control register");
        }

        result
    }

    fn handshake(&self, channel: Channel) -> Result<Option<f64>> {
        let mut settled = false;
        for _ in 0..HANDSHAKE_RETRIES {
            self.method.write_byte(self.port, self.dev_addr, R30_ADC_CONTROL, NULL_CHANNEL_CODE)?;
            let ctrl = self.method.read_byte(self.port, self.dev_addr, R30_ADC_CONTROL)?;
            let reading = self.method.read_byte(self.port, self.dev_addr, R31_ADC_READ)?;
            if ctrl == NULL_CHANNEL_CODE && reading == 0 {
                settled = true;
                break;
            }
        }
        if !settled {
            return Ok(None);
        }

        let code = channel.select_code();
        for _ in 0..HANDSHAKE_RETRIES {
            self.method.write_byte(self.port, self.dev_addr, R30_ADC_CONTROL, code)?;
            let ctrl = self.method.read_byte(self.port, self.dev_addr, R30_ADC_CONTROL)?;
            let reading = self.method.read_byte(self.port, self.dev_addr, R31_ADC_READ)?;
            if ctrl == code && reading != 0 {
                return Ok(Some(f64::from(reading) * channel.multiplier()));
            }
        }
        Ok(None)
    }

    /// `R1A`/`R1B` carry a vendor-specific status pair some Richtek parts
    /// expose alongside the ADC block; read-only, decoded as raw bytes
    /// since the spec does not assign them a numeric meaning.
    pub fn read_status_pair(&self) -> Result<(u8, u8)> {
        let a = self.method.read_byte(self.port, self.dev_addr, R1A)?;
        let b = self.method.read_byte(self.port, self.dev_addr, R1B)?;
        Ok((a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn richtek_identity_check_matches_jep106_table() {
        let id = Identity { vendor_id_raw: RICHTEK_VENDOR_RAW, vendor_name: Some("Richtek Technology"), revision: 1 };
        assert!(RichtekPmic::<crate::method::DriverMethod>::is_richtek(&id));
    }

    #[test]
    fn vin_multiplier_differs_from_rail_multiplier() {
        assert_eq!(Channel::Vin.multiplier(), 0.070);
        assert_eq!(Channel::Swa.multiplier(), 0.015);
    }
}
