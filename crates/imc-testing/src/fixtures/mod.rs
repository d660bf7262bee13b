//! Golden byte fixtures (spec `SPEC_FULL.md` §F): realistic MCHBAR
//! per-channel blocks and MR-storage blobs for both register-map
//! generations, built by hand-placing the same bit fields
//! `imc_platform::regmap`/`imc_platform::mrs` extract.

pub mod mchbar;
pub mod mrs;
