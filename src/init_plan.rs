//! Ordered CSR writes of the RISC-V privileged initialization.
//!
//! Every error is decided here, before anything touches the hart, so a
//! failed init leaves the PMU and `mie` as they were.

use crate::config::PmuConfig;
use crate::PerfError;

/// Privilege extensions reported by `misa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extensions {
    pub supervisor: bool,
    pub user: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrWrite {
    Scounteren(u32),
    Mcounteren(u32),
    /// `mhpmevent<index> = event`
    MhpmEvent(u8, u64),
    /// Set `mie.MSIE`, other enable bits untouched.
    SetMsie,
}

const MAX_WRITES: usize = 7;

/// At most one write per register, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitPlan {
    writes: [Option<CsrWrite>; MAX_WRITES],
}

impl InitPlan {
    /// `misa` is `None` when the register is not implemented.
    pub fn new(misa: Option<Extensions>, config: &PmuConfig) -> Result<InitPlan, PerfError> {
        let extensions = misa.ok_or(PerfError::UnsupportedPlatform)?;
        if !extensions.user {
            return Err(PerfError::MissingExtension('U'));
        }
        config.validate()?;
        if extensions.supervisor {
            config.validate_scounteren()?;
        }

        let mut plan = InitPlan {
            writes: [None; MAX_WRITES],
        };
        let mut len = 0;
        let mut push = |write| {
            plan.writes[len] = Some(write);
            len += 1;
        };
        if extensions.supervisor {
            push(CsrWrite::Scounteren(config.scounteren()));
        }
        push(CsrWrite::Mcounteren(config.mcounteren()));
        for (index, event) in config.event_selectors() {
            push(CsrWrite::MhpmEvent(index, event));
        }
        push(CsrWrite::SetMsie);
        Ok(plan)
    }

    pub fn writes(&self) -> impl Iterator<Item = CsrWrite> + '_ {
        self.writes.iter().flatten().copied()
    }
}
