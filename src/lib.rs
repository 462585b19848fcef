#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Start/stop snapshots of hardware performance counters around a benchmarked
//! code region, and a fixed-format report of the deltas.
//!
//! ```rust,ignore
//! let mut pmu = unsafe { HpmCounters::init(&PmuConfig::default())? };
//! let timer = Timer::default().start_snapshot(&mut pmu);
//! workload();
//! let timer = timer.stop_snapshot(&mut pmu);
//! timer.report().write_to(&mut uart)?;
//! ```

pub mod config;
pub mod error;
pub mod init_plan;
pub mod report;
pub mod timer;

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub mod riscv;
#[cfg(target_arch = "x86_64")]
pub mod x86_intel;

pub use crate::config::PmuConfig;
pub use crate::error::PerfError;
pub use crate::report::Report;
pub use crate::timer::{measure, CounterSample, Timer};

#[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
pub use crate::riscv::HpmCounters;
#[cfg(target_arch = "x86_64")]
pub use crate::x86_intel::PerfCounter;

/// Raw access to the counters a [`Timer`] snapshots.
///
/// Hardware backends read one fixed register per method. Reads have no side
/// effects and never fail.
pub trait CounterSource {
    /// Free-running cycle count.
    fn cycles(&mut self) -> u64;

    /// Wall-clock-like timer. Not part of a snapshot.
    fn time(&mut self) -> u64;

    /// Retired instructions.
    fn instructions_retired(&mut self) -> u64;

    /// Instruction cache misses.
    fn instr_cache_misses(&mut self) -> u64;

    /// Taken branches.
    fn branches_taken(&mut self) -> u64;

    /// Branch direction or target mispredictions.
    fn branch_misses(&mut self) -> u64;

    /// Data cache misses.
    fn data_cache_misses(&mut self) -> u64;
}
