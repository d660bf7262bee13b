//! Simulated register/bus fixtures (spec F / `SPEC_FULL.md` §F): lets
//! `imc-kio`'s callers be exercised on any host, without a real driver
//! handle. Mirrors the teacher's `crates/testing` top-level shape (one
//! fixture module per concern) scoped down to this domain.

pub mod fake_kio;
pub mod fixtures;
pub mod strategies;

pub use fake_kio::FakeKio;
