use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfError {
    /// The hardware does not expose the counters or the probe registers.
    UnsupportedPlatform,
    /// A privilege extension needed to program the event selectors is absent.
    MissingExtension(char),
    /// A counter read by a snapshot is masked off in a counter-enable register.
    CounterNotEnabled(u8),
}

impl fmt::Display for PerfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerfError::UnsupportedPlatform => {
                write!(f, "performance counters are not supported on this platform")
            }
            PerfError::MissingExtension(ext) => {
                write!(f, "missing '{}' privilege extension", ext)
            }
            PerfError::CounterNotEnabled(index) => {
                write!(f, "counter {} is not enabled for lower privilege levels", index)
            }
        }
    }
}

#[cfg(any(test, feature = "std"))]
impl std::error::Error for PerfError {}
