//! Counters of the RISC-V hardware performance-monitoring unit.
//!
//! Reads go through the unprivileged `cycle`/`time`/`instret`/`hpmcounterN`
//! aliases. They work in M-mode unconditionally and in S/U-mode once the
//! counter-enable registers allow them, which [`HpmCounters::init`] does.

use core::arch::asm;

use log::{debug, warn};
use ::riscv::register::{mie, misa};

use crate::config::PmuConfig;
use crate::init_plan::{CsrWrite, Extensions, InitPlan};
use crate::{CounterSource, PerfError};

/// Reads a 64-bit counter CSR.
#[cfg(target_arch = "riscv64")]
macro_rules! read_csr64 {
    ($csr:literal, $csrh:literal) => {{
        let value: u64;
        unsafe { asm!(concat!("csrr {0}, ", $csr), out(reg) value, options(nomem, nostack)) };
        value
    }};
}

/// Reads a 64-bit counter CSR from its low/high halves. The high half is read
/// on both sides of the low half and the read retried if it changed.
#[cfg(target_arch = "riscv32")]
macro_rules! read_csr64 {
    ($csr:literal, $csrh:literal) => {{
        loop {
            let hi: u32;
            let lo: u32;
            let hi2: u32;
            unsafe {
                asm!(
                    concat!("csrr {0}, ", $csrh),
                    concat!("csrr {1}, ", $csr),
                    concat!("csrr {2}, ", $csrh),
                    out(reg) hi,
                    out(reg) lo,
                    out(reg) hi2,
                    options(nomem, nostack),
                )
            };
            if hi == hi2 {
                break ((hi as u64) << 32) | lo as u64;
            }
        }
    }};
}

/// Writes `$value` to the named CSR. Caller must hold the privilege the
/// register requires.
macro_rules! write_csr {
    ($csr:literal, $value:expr) => {
        asm!(concat!("csrw ", $csr, ", {0}"), in(reg) $value as usize, options(nostack))
    };
}

/// Handle to a hart whose event selectors have been programmed.
///
/// Only [`HpmCounters::init`] hands one out, so holding it proves the
/// privileged setup ran. Counters are per hart: use the handle on the hart
/// that initialized it.
#[derive(Debug)]
pub struct HpmCounters {
    config: PmuConfig,
}

impl HpmCounters {
    /// Enables counter access for lower privilege levels, programs the event
    /// selectors, then sets the machine software-interrupt enable bit.
    ///
    /// Nothing is written when an error is returned.
    ///
    /// # Safety
    ///
    /// Must run in M-mode, once per hart, before any snapshot. Writes
    /// machine-mode CSRs; any other privilege level traps.
    pub unsafe fn init(config: &PmuConfig) -> Result<HpmCounters, PerfError> {
        let extensions = misa::read().map(|misa| Extensions {
            supervisor: misa.has_extension('S'),
            user: misa.has_extension('U'),
        });
        let plan = match InitPlan::new(extensions, config) {
            Ok(plan) => plan,
            Err(e) => {
                warn!("PMU left unconfigured ({:?}): {}", extensions, e);
                return Err(e);
            }
        };

        for write in plan.writes() {
            match write {
                CsrWrite::Scounteren(mask) => write_csr!("scounteren", mask),
                CsrWrite::Mcounteren(mask) => write_csr!("mcounteren", mask),
                CsrWrite::MhpmEvent(3, event) => write_csr!("mhpmevent3", event),
                CsrWrite::MhpmEvent(4, event) => write_csr!("mhpmevent4", event),
                CsrWrite::MhpmEvent(5, event) => write_csr!("mhpmevent5", event),
                CsrWrite::MhpmEvent(6, event) => write_csr!("mhpmevent6", event),
                CsrWrite::MhpmEvent(index, _) => unreachable!("no selector for counter {}", index),
                CsrWrite::SetMsie => mie::set_msoft(),
            }
            debug!("{:x?}", write);
        }

        Ok(HpmCounters { config: *config })
    }

    pub fn config(&self) -> &PmuConfig {
        &self.config
    }
}

impl CounterSource for HpmCounters {
    #[inline(always)]
    fn cycles(&mut self) -> u64 {
        read_csr64!("cycle", "cycleh")
    }

    #[inline(always)]
    fn time(&mut self) -> u64 {
        read_csr64!("time", "timeh")
    }

    #[inline(always)]
    fn instructions_retired(&mut self) -> u64 {
        read_csr64!("instret", "instreth")
    }

    #[inline(always)]
    fn instr_cache_misses(&mut self) -> u64 {
        read_csr64!("hpmcounter3", "hpmcounter3h")
    }

    #[inline(always)]
    fn branches_taken(&mut self) -> u64 {
        read_csr64!("hpmcounter4", "hpmcounter4h")
    }

    #[inline(always)]
    fn branch_misses(&mut self) -> u64 {
        read_csr64!("hpmcounter5", "hpmcounter5h")
    }

    #[inline(always)]
    fn data_cache_misses(&mut self) -> u64 {
        read_csr64!("hpmcounter6", "hpmcounter6h")
    }
}
