//! CPUID leaf 0AH probe and the IA32_PERF_GLOBAL_CTRL enable bits.

use core::arch::x86_64::__cpuid;

use x86::msr::{rdmsr, wrmsr};

use crate::PerfError;

pub const IA32_PERF_GLOBAL_CTRL: u32 = 0x38F;

/// Architectural PMU capabilities reported by CPUID.0AH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub version_identifier: u8,
    pub number_msr: u8,
    pub bit_width: u8,
    pub number_fixed_function_counter: u8,
    pub bit_width_fixed_counter: u8,
}

impl Capabilities {
    pub fn probe() -> Capabilities {
        let leaf = unsafe { __cpuid(0x0A) };
        Capabilities::from_leaf(leaf.eax, leaf.edx)
    }

    pub fn from_leaf(eax: u32, edx: u32) -> Capabilities {
        let mask = 0xFF;
        Capabilities {
            version_identifier: (eax & mask) as u8,
            number_msr: ((eax >> 8) & mask) as u8,
            bit_width: ((eax >> 16) & mask) as u8,
            number_fixed_function_counter: (edx & 0x1F) as u8,
            bit_width_fixed_counter: ((edx >> 5) & 0xFF) as u8,
        }
    }

    /// Four programmable plus two fixed counters, and the global control
    /// MSR that only exists from version 2 on.
    pub fn check(&self) -> Result<(), PerfError> {
        if self.version_identifier < 2
            || self.number_msr < 4
            || self.number_fixed_function_counter < 2
        {
            return Err(PerfError::UnsupportedPlatform);
        }
        Ok(())
    }
}

/// Bit of IA32_PERF_GLOBAL_CTRL enabling programmable counter `index`.
pub const fn general_enable_bit(index: u8) -> u64 {
    1 << index
}

/// Bit of IA32_PERF_GLOBAL_CTRL enabling fixed counter `index`.
pub const fn fixed_enable_bit(index: u8) -> u64 {
    1 << (index as u64 + 32)
}

/// Sets `bits` in IA32_PERF_GLOBAL_CTRL, leaving the rest as they are.
///
/// # Safety
///
/// Ring 0 on a PMU of version 2 or later.
pub unsafe fn enable_counters(bits: u64) {
    let current = rdmsr(IA32_PERF_GLOBAL_CTRL);
    wrmsr(IA32_PERF_GLOBAL_CTRL, current | bits);
}
