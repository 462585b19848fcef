use core::fmt;

use crate::CounterSample;

const HEADER: &str = "# ---------- Timing data for benchmark: ---------- #";
const FOOTER: &str = "# ------------------------------------------------- #";

/// Per-metric deltas of a [`Timer`](crate::Timer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub cycles: u64,
    pub instructions: u64,
    pub instr_cache_misses: u64,
    pub branch_misses: u64,
    pub branches: u64,
    pub data_cache_misses: u64,
}

impl From<CounterSample> for Report {
    fn from(delta: CounterSample) -> Self {
        Report {
            cycles: delta.cycles,
            instructions: delta.instructions,
            instr_cache_misses: delta.instr_cache_misses,
            branch_misses: delta.branch_misses,
            branches: delta.branches_taken,
            data_cache_misses: delta.data_cache_misses,
        }
    }
}

impl Report {
    /// Rows in output order.
    pub fn rows(&self) -> [(u64, &'static str); 6] {
        [
            (self.cycles, "cycles executed"),
            (self.instructions, "instructions executed"),
            (self.instr_cache_misses, "instruction cache-misses"),
            (self.branch_misses, "branch-misses"),
            (self.branches, "branches"),
            (self.data_cache_misses, "data cache-misses"),
        ]
    }

    pub fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{}", self)
    }

    /// Writes the report block to standard output. Same text as
    /// [`write_to`](Report::write_to).
    #[cfg(any(test, feature = "std"))]
    pub fn print(&self) {
        print!("{}", self);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", HEADER)?;
        for (value, label) in self.rows() {
            writeln!(f, "{}        {:<30}#", value, label)?;
        }
        writeln!(f, "{}", FOOTER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let report = Report {
            cycles: 100,
            instructions: 50,
            instr_cache_misses: 0,
            branch_misses: 1,
            branches: 15,
            data_cache_misses: 3,
        };
        let expected = "\
# ---------- Timing data for benchmark: ---------- #
100        cycles executed               #
50        instructions executed         #
0        instruction cache-misses      #
1        branch-misses                 #
15        branches                      #
3        data cache-misses             #
# ------------------------------------------------- #
";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_write_to() {
        let report = Report {
            cycles: 7,
            ..Default::default()
        };
        let mut out = String::new();
        report.write_to(&mut out).unwrap();
        assert_eq!(out, report.to_string());
        assert_eq!(out.lines().count(), 8);
    }

    #[test]
    fn test_print() {
        Report {
            cycles: 1,
            ..Default::default()
        }
        .print();
    }

    #[test]
    fn test_from_sample_maps_branches_taken() {
        let report = Report::from(CounterSample {
            branches_taken: 9,
            branch_misses: 4,
            ..Default::default()
        });
        assert_eq!(report.branches, 9);
        assert_eq!(report.branch_misses, 4);
    }
}
