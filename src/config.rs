//! Event-to-counter mapping and counter-enable masks applied by the
//! privileged initialization.

use crate::PerfError;

/// Counter index of the instruction cache miss counter.
pub const INSTR_CACHE_MISS_COUNTER: u8 = 3;
/// Counter index of the taken branch counter.
pub const BRANCH_TAKEN_COUNTER: u8 = 4;
/// Counter index of the branch misprediction counter.
pub const BRANCH_MISS_COUNTER: u8 = 5;
/// Counter index of the data cache miss counter.
pub const DATA_CACHE_MISS_COUNTER: u8 = 6;

/// Rocket/BOOM event selector encodings. The low byte is the event set, the
/// upper bits the event mask within it.
pub const EVENT_INSTR_CACHE_MISS: u64 = 0x102;
pub const EVENT_BRANCH_TAKEN: u64 = 0x4000;
pub const EVENT_BRANCH_MISPREDICT: u64 = 0x6001;
pub const EVENT_DATA_CACHE_MISS: u64 = 0x202;

const CY: u8 = 0;
const IR: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmuConfig {
    instr_cache_miss_event: u64,
    branch_taken_event: u64,
    branch_miss_event: u64,
    data_cache_miss_event: u64,
    scounteren: u32,
    mcounteren: u32,
}

impl Default for PmuConfig {
    fn default() -> Self {
        PmuConfig {
            instr_cache_miss_event: EVENT_INSTR_CACHE_MISS,
            branch_taken_event: EVENT_BRANCH_TAKEN,
            branch_miss_event: EVENT_BRANCH_MISPREDICT,
            data_cache_miss_event: EVENT_DATA_CACHE_MISS,
            scounteren: u32::MAX,
            mcounteren: u32::MAX,
        }
    }
}

impl PmuConfig {
    pub fn with_instr_cache_miss_event(mut self, event: u64) -> Self {
        self.instr_cache_miss_event = event;
        self
    }

    pub fn with_branch_taken_event(mut self, event: u64) -> Self {
        self.branch_taken_event = event;
        self
    }

    pub fn with_branch_miss_event(mut self, event: u64) -> Self {
        self.branch_miss_event = event;
        self
    }

    pub fn with_data_cache_miss_event(mut self, event: u64) -> Self {
        self.data_cache_miss_event = event;
        self
    }

    /// Mask written to `scounteren` (user-mode access when running under a
    /// supervisor).
    pub fn with_scounteren(mut self, mask: u32) -> Self {
        self.scounteren = mask;
        self
    }

    /// Mask written to `mcounteren` (access from the next lower privilege level).
    pub fn with_mcounteren(mut self, mask: u32) -> Self {
        self.mcounteren = mask;
        self
    }

    pub fn scounteren(&self) -> u32 {
        self.scounteren
    }

    pub fn mcounteren(&self) -> u32 {
        self.mcounteren
    }

    /// `(counter index, event code)` for each programmable counter, in
    /// selector order.
    pub fn event_selectors(&self) -> [(u8, u64); 4] {
        [
            (INSTR_CACHE_MISS_COUNTER, self.instr_cache_miss_event),
            (BRANCH_TAKEN_COUNTER, self.branch_taken_event),
            (BRANCH_MISS_COUNTER, self.branch_miss_event),
            (DATA_CACHE_MISS_COUNTER, self.data_cache_miss_event),
        ]
    }

    /// Every counter a snapshot reads must be enabled in `mcounteren`.
    pub fn validate(&self) -> Result<(), PerfError> {
        check_mask(self.mcounteren)
    }

    /// Same check for `scounteren`. Only relevant on harts with S-mode, the
    /// only ones where that register gets written.
    pub fn validate_scounteren(&self) -> Result<(), PerfError> {
        check_mask(self.scounteren)
    }
}

fn check_mask(mask: u32) -> Result<(), PerfError> {
    let required = [
        CY,
        IR,
        INSTR_CACHE_MISS_COUNTER,
        BRANCH_TAKEN_COUNTER,
        BRANCH_MISS_COUNTER,
        DATA_CACHE_MISS_COUNTER,
    ];
    for index in required {
        if mask & (1u32 << index) == 0 {
            return Err(PerfError::CounterNotEnabled(index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mapping() {
        let config = PmuConfig::default();
        assert_eq!(
            config.event_selectors(),
            [(3, 0x102), (4, 0x4000), (5, 0x6001), (6, 0x202)]
        );
        assert_eq!(config.scounteren(), u32::MAX);
        assert_eq!(config.mcounteren(), u32::MAX);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.validate_scounteren(), Ok(()));
    }

    #[test]
    fn test_override_event() {
        let config = PmuConfig::default().with_data_cache_miss_event(0x802);
        assert_eq!(config.event_selectors()[3], (6, 0x802));
        assert_eq!(config.event_selectors()[0], (3, 0x102));
    }

    #[test]
    fn test_validate_rejects_masked_counter() {
        let config = PmuConfig::default().with_mcounteren(!(1 << 5));
        assert_eq!(config.validate(), Err(PerfError::CounterNotEnabled(5)));

        let config = PmuConfig::default().with_scounteren(0);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(
            config.validate_scounteren(),
            Err(PerfError::CounterNotEnabled(0))
        );
    }

    #[test]
    fn test_validate_ignores_time_bit() {
        let config = PmuConfig::default().with_mcounteren(!(1 << 1));
        assert_eq!(config.validate(), Ok(()));
    }
}
