use rust_perfcnt_timers::{CounterSample, CounterSource, Report, Timer};

/// Replays scripted samples, one per snapshot.
struct ScriptedSource {
    samples: Vec<CounterSample>,
    current: CounterSample,
}

impl ScriptedSource {
    fn new(mut samples: Vec<CounterSample>) -> Self {
        samples.reverse();
        ScriptedSource {
            samples,
            current: CounterSample::default(),
        }
    }
}

impl CounterSource for ScriptedSource {
    // instret is the first read of every snapshot
    fn instructions_retired(&mut self) -> u64 {
        self.current = self.samples.pop().expect("script exhausted");
        self.current.instructions
    }
    fn cycles(&mut self) -> u64 {
        self.current.cycles
    }
    fn time(&mut self) -> u64 {
        0
    }
    fn instr_cache_misses(&mut self) -> u64 {
        self.current.instr_cache_misses
    }
    fn branches_taken(&mut self) -> u64 {
        self.current.branches_taken
    }
    fn branch_misses(&mut self) -> u64 {
        self.current.branch_misses
    }
    fn data_cache_misses(&mut self) -> u64 {
        self.current.data_cache_misses
    }
}

fn start_sample() -> CounterSample {
    CounterSample {
        instructions: 100,
        cycles: 200,
        branches_taken: 10,
        instr_cache_misses: 5,
        branch_misses: 2,
        data_cache_misses: 1,
    }
}

fn stop_sample() -> CounterSample {
    CounterSample {
        instructions: 150,
        cycles: 300,
        branches_taken: 25,
        instr_cache_misses: 5,
        branch_misses: 3,
        data_cache_misses: 4,
    }
}

fn run(source: &mut ScriptedSource) -> Timer {
    let timer = Timer::new().start_snapshot(source);
    timer.stop_snapshot(source)
}

#[test]
fn reports_exact_deltas() {
    let mut source = ScriptedSource::new(vec![start_sample(), stop_sample()]);
    let timer = run(&mut source);

    assert_eq!(timer.start, start_sample());
    assert_eq!(timer.stop, stop_sample());
    assert_eq!(
        timer.report(),
        Report {
            cycles: 100,
            instructions: 50,
            instr_cache_misses: 0,
            branch_misses: 1,
            branches: 15,
            data_cache_misses: 3,
        }
    );

    let text = timer.report().to_string();
    assert!(text.contains("100        cycles executed               #\n"));
    assert!(text.contains("15        branches                      #\n"));
}

#[test]
fn snapshots_leave_other_half_alone() {
    let third = CounterSample {
        instructions: 999,
        ..stop_sample()
    };
    let mut source = ScriptedSource::new(vec![start_sample(), stop_sample(), third]);
    let timer = run(&mut source);

    let again = timer.stop_snapshot(&mut source);
    assert_eq!(again.start, start_sample());
    assert_eq!(again.stop, third);
}

#[test]
fn wrapped_counter_is_not_clamped() {
    let stop = CounterSample {
        branch_misses: 1,
        ..stop_sample()
    };
    let mut source = ScriptedSource::new(vec![start_sample(), stop]);
    let report = run(&mut source).report();

    // start 2, stop 1
    assert_eq!(report.branch_misses, u64::MAX);
    assert_eq!(report.branch_misses, 0u64.wrapping_sub(2 - 1));
    assert_eq!(report.cycles, 100);
}

#[test]
fn independent_timers_agree() {
    let script = vec![start_sample(), stop_sample()];
    let first = run(&mut ScriptedSource::new(script.clone())).report();
    let second = run(&mut ScriptedSource::new(script)).report();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn measure_wraps_workload() {
    let mut source = ScriptedSource::new(vec![start_sample(), stop_sample()]);
    let mut ran = false;
    let (report, ()) = rust_perfcnt_timers::measure(&mut source, || ran = true);
    assert!(ran);
    assert_eq!(report.instructions, 50);
}
