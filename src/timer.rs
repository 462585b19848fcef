use core::sync::atomic::{compiler_fence, Ordering};

use crate::{CounterSource, Report};

/// One reading of every snapshotted metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSample {
    pub instructions: u64,
    pub cycles: u64,
    pub branches_taken: u64,
    pub instr_cache_misses: u64,
    pub branch_misses: u64,
    pub data_cache_misses: u64,
}

impl CounterSample {
    /// Reads the six counters back to back. The group is not atomic: each
    /// read happens a few cycles after the previous one.
    #[inline]
    pub fn capture<S: CounterSource>(source: &mut S) -> CounterSample {
        compiler_fence(Ordering::SeqCst);
        let instructions = source.instructions_retired();
        let cycles = source.cycles();
        let branches_taken = source.branches_taken();
        let instr_cache_misses = source.instr_cache_misses();
        let branch_misses = source.branch_misses();
        let data_cache_misses = source.data_cache_misses();
        compiler_fence(Ordering::SeqCst);
        CounterSample {
            instructions,
            cycles,
            branches_taken,
            instr_cache_misses,
            branch_misses,
            data_cache_misses,
        }
    }

    /// Per-field `self - earlier`. A counter that went backwards wraps.
    pub fn wrapping_sub(&self, earlier: &CounterSample) -> CounterSample {
        CounterSample {
            instructions: self.instructions.wrapping_sub(earlier.instructions),
            cycles: self.cycles.wrapping_sub(earlier.cycles),
            branches_taken: self.branches_taken.wrapping_sub(earlier.branches_taken),
            instr_cache_misses: self
                .instr_cache_misses
                .wrapping_sub(earlier.instr_cache_misses),
            branch_misses: self.branch_misses.wrapping_sub(earlier.branch_misses),
            data_cache_misses: self
                .data_cache_misses
                .wrapping_sub(earlier.data_cache_misses),
        }
    }
}

/// Start and stop snapshots of one benchmarked region.
///
/// `stop` is only meaningful once both snapshots were taken through a source
/// that was initialized on the same hart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    pub start: CounterSample,
    pub stop: CounterSample,
}

impl Timer {
    pub fn new() -> Timer {
        Timer::default()
    }

    /// Returns a copy with `start` replaced by a fresh sample.
    #[must_use]
    pub fn start_snapshot<S: CounterSource>(mut self, source: &mut S) -> Timer {
        self.start = CounterSample::capture(source);
        self
    }

    /// Returns a copy with `stop` replaced by a fresh sample.
    #[must_use]
    pub fn stop_snapshot<S: CounterSource>(mut self, source: &mut S) -> Timer {
        self.stop = CounterSample::capture(source);
        self
    }

    pub fn report(&self) -> Report {
        Report::from(self.stop.wrapping_sub(&self.start))
    }
}

/// Runs `f` between a start and a stop snapshot.
pub fn measure<S, F, R>(source: &mut S, f: F) -> (Report, R)
where
    S: CounterSource,
    F: FnOnce() -> R,
{
    let timer = Timer::new().start_snapshot(source);
    let ret = f();
    let timer = timer.stop_snapshot(source);
    (timer.report(), ret)
}
