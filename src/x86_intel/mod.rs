//! Intel architectural PMU backend (version 2 or later).
//!
//! Programmable counters 0..3 take the roles of the RISC-V hpmcounter3..6,
//! fixed counter 0 counts retired instructions and fixed counter 1 unhalted
//! core cycles.

pub mod global_ctrl;

use core::arch::asm;

use log::{debug, warn};
use x86::msr::wrmsr;

use crate::{CounterSource, PerfError};
use global_ctrl::{enable_counters, fixed_enable_bit, general_enable_bit, Capabilities};

pub const IA32_PERFEVTSEL0: u32 = 0x186;
pub const IA32_FIXED_CTR_CTRL: u32 = 0x38D;

pub const USR_MASK: u64 = 1 << 16;
pub const OS_MASK: u64 = 1 << 17;
pub const ENABLE_GENERAL_PMC_MASK: u64 = 1 << 22;

/// Fixed counter control nibble: count in ring 0 and ring 3.
const FIXED_CTR_ALL_RINGS: u64 = 0b0011;

pub const FIXED_INSTRUCTIONS_RETIRED: u8 = 0;
pub const FIXED_CORE_CYCLES: u8 = 1;

/// `(event select, umask)` pairs, Skylake encodings.
pub const ICACHE_64B_IFTAG_MISS: (u8, u8) = (0x83, 0x02);
pub const BR_INST_RETIRED_NEAR_TAKEN: (u8, u8) = (0xC4, 0x20);
pub const BR_MISP_RETIRED_ALL_BRANCHES: (u8, u8) = (0xC5, 0x00);
pub const L1D_REPLACEMENT: (u8, u8) = (0x51, 0x01);

pub const PMC_INSTR_CACHE_MISS: u8 = 0;
pub const PMC_BRANCH_TAKEN: u8 = 1;
pub const PMC_BRANCH_MISS: u8 = 2;
pub const PMC_DATA_CACHE_MISS: u8 = 3;

/// IA32_PERFEVTSELx value counting `event` in both rings.
pub fn build_general_from_raw(event: (u8, u8)) -> u64 {
    let (event_select, umask) = event;
    let mut mask = event_select as u64;
    mask |= (umask as u64) << 8;
    mask |= USR_MASK | OS_MASK;
    mask | ENABLE_GENERAL_PMC_MASK
}

/// Handle to a core whose counters have been programmed.
#[derive(Debug)]
pub struct PerfCounter {
    capabilities: Capabilities,
}

impl PerfCounter {
    /// Probes CPUID.0AH, programs the four event selectors and enables the
    /// fixed instruction and cycle counters.
    ///
    /// # Safety
    ///
    /// Ring 0, once per core, before any snapshot on that core. `rdpmc`
    /// from ring 3 additionally needs CR4.PCE.
    pub unsafe fn init() -> Result<PerfCounter, PerfError> {
        let capabilities = Capabilities::probe();
        if let Err(e) = capabilities.check() {
            warn!("unsupported PMU: {:?}", capabilities);
            return Err(e);
        }

        let selectors = [
            (PMC_INSTR_CACHE_MISS, ICACHE_64B_IFTAG_MISS),
            (PMC_BRANCH_TAKEN, BR_INST_RETIRED_NEAR_TAKEN),
            (PMC_BRANCH_MISS, BR_MISP_RETIRED_ALL_BRANCHES),
            (PMC_DATA_CACHE_MISS, L1D_REPLACEMENT),
        ];
        let mut global = 0;
        for (index, event) in selectors {
            let mask = build_general_from_raw(event);
            wrmsr(IA32_PERFEVTSEL0 + index as u32, mask);
            debug!("IA32_PERFEVTSEL{} = {:#x}", index, mask);
            global |= general_enable_bit(index);
        }

        let fixed = (FIXED_CTR_ALL_RINGS << (FIXED_INSTRUCTIONS_RETIRED * 4))
            | (FIXED_CTR_ALL_RINGS << (FIXED_CORE_CYCLES * 4));
        wrmsr(IA32_FIXED_CTR_CTRL, fixed);
        debug!("IA32_FIXED_CTR_CTRL = {:#x}", fixed);
        global |= fixed_enable_bit(FIXED_INSTRUCTIONS_RETIRED) | fixed_enable_bit(FIXED_CORE_CYCLES);

        enable_counters(global);
        debug!("IA32_PERF_GLOBAL_CTRL |= {:#x}", global);

        Ok(PerfCounter { capabilities })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[inline(always)]
    pub fn read_general_pmc_ctr(&self, index: u8) -> u64 {
        rdpmc(index as u32)
    }

    #[inline(always)]
    pub fn read_fixed_pmc_ctr(&self, index: u8) -> u64 {
        rdpmc(index as u32 | (1 << 30))
    }
}

#[inline(always)]
fn rdpmc(selector: u32) -> u64 {
    let lo: u32;
    let hi: u32;
    unsafe {
        asm!(
            "rdpmc",
            in("ecx") selector,
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack),
        );
    }
    ((hi as u64) << 32) | lo as u64
}

impl CounterSource for PerfCounter {
    fn cycles(&mut self) -> u64 {
        self.read_fixed_pmc_ctr(FIXED_CORE_CYCLES)
    }

    fn time(&mut self) -> u64 {
        unsafe { x86::time::rdtsc() }
    }

    fn instructions_retired(&mut self) -> u64 {
        self.read_fixed_pmc_ctr(FIXED_INSTRUCTIONS_RETIRED)
    }

    fn instr_cache_misses(&mut self) -> u64 {
        self.read_general_pmc_ctr(PMC_INSTR_CACHE_MISS)
    }

    fn branches_taken(&mut self) -> u64 {
        self.read_general_pmc_ctr(PMC_BRANCH_TAKEN)
    }

    fn branch_misses(&mut self) -> u64 {
        self.read_general_pmc_ctr(PMC_BRANCH_MISS)
    }

    fn data_cache_misses(&mut self) -> u64 {
        self.read_general_pmc_ctr(PMC_DATA_CACHE_MISS)
    }
}
