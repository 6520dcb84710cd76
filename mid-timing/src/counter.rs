use std::time::Duration;

use mid_core::{QuitSignal, Result, TaskError};

use crate::clock::Clock;
use crate::pulse::PulseSource;

/// TR bookkeeping on top of a pulse source. Holds the wait/drain logic only;
/// all hardware and emulation details live in the source.
///
/// The baseline partitions the pulse stream: every pulse is returned by
/// exactly one `drain()` or `wait_for_tr()` call, never twice.
pub struct PulseCounter<S, C> {
    source: S,
    clock: C,
    pulses_per_tr: u64,
    poll: Duration,
    baseline: u64,
}

impl<S: PulseSource, C: Clock> PulseCounter<S, C> {
    pub fn new(mut source: S, clock: C, pulses_per_tr: u64, poll: Duration) -> Result<Self> {
        let baseline = source.read_count()?;
        Ok(Self { source, clock, pulses_per_tr, poll, baseline })
    }

    pub fn pulses_per_tr(&self) -> u64 {
        self.pulses_per_tr
    }

    /// Marks scan start on the source and rebases on the current count.
    pub fn start(&mut self) -> Result<()> {
        self.source.start();
        self.baseline = self.source.read_count()?;
        Ok(())
    }

    /// Blocks until the first pulse advance. Used once, to gate the session
    /// on the scanner actually running.
    pub fn wait_for_start<Q: QuitSignal>(&mut self, quit: &Q) -> Result<()> {
        let initial = self.baseline;
        loop {
            let count = self.source.read_count()?;
            if count > initial {
                self.baseline = count;
                return Ok(());
            }
            if quit.should_quit() {
                return Err(TaskError::UserQuit);
            }
            self.clock.sleep(self.poll);
        }
    }

    /// Blocks until one full TR's worth of pulses has arrived past the
    /// baseline, polling with a short sleep. Observes the quit signal each
    /// poll. Returns the pulses actually observed on this wait and rebases on
    /// the observed count.
    pub fn wait_for_tr<Q: QuitSignal>(&mut self, quit: &Q) -> Result<u64> {
        let target = self.baseline + self.pulses_per_tr;
        loop {
            let count = self.source.read_count()?;
            if count >= target {
                let delta = count - self.baseline;
                self.baseline = count;
                return Ok(delta);
            }
            if quit.should_quit() {
                return Err(TaskError::UserQuit);
            }
            self.clock.sleep(self.poll);
        }
    }

    /// Pulses accumulated since the last baseline, without blocking.
    pub fn drain(&mut self) -> Result<u64> {
        let count = self.source.read_count()?;
        let delta = count.saturating_sub(self.baseline);
        self.baseline = count;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pulse::EmulatedPulseSource;
    use mid_core::QuitFlag;

    const TR: Duration = Duration::from_millis(200);
    const POLL: Duration = Duration::from_millis(1);

    fn counter(clock: &ManualClock, pulses_per_tr: u64) -> PulseCounter<EmulatedPulseSource<ManualClock>, ManualClock> {
        let source = EmulatedPulseSource::new(clock.clone(), pulses_per_tr, TR);
        let mut counter = PulseCounter::new(source, clock.clone(), pulses_per_tr, POLL).unwrap();
        counter.start().unwrap();
        counter
    }

    #[test]
    fn wait_for_tr_blocks_until_pulses_arrive() {
        let clock = ManualClock::new();
        let mut counter = counter(&clock, 10);
        let quit = QuitFlag::new();

        let before = clock.now();
        let delta = counter.wait_for_tr(&quit).unwrap();
        assert_eq!(delta, 10);
        // One TR of sleeping happened inside the wait.
        assert!(clock.now() - before >= TR);
    }

    #[test]
    fn wait_for_tr_returns_exact_delta_when_scanner_ran_ahead() {
        let clock = ManualClock::new();
        let mut counter = counter(&clock, 10);
        let quit = QuitFlag::new();

        // Scanner produced two and a half TRs while the task was busy.
        clock.advance(Duration::from_millis(500));
        let delta = counter.wait_for_tr(&quit).unwrap();
        assert_eq!(delta, 25);
        // Baseline resynced: the next wait only needs one more TR.
        let delta = counter.wait_for_tr(&quit).unwrap();
        assert_eq!(delta, 10);
    }

    #[test]
    fn drain_returns_zero_when_no_new_pulses() {
        let clock = ManualClock::new();
        let mut counter = counter(&clock, 10);
        assert_eq!(counter.drain().unwrap(), 0);
        assert_eq!(counter.drain().unwrap(), 0);
    }

    #[test]
    fn drain_partitions_the_pulse_stream() {
        let clock = ManualClock::new();
        let mut counter = counter(&clock, 10);
        let quit = QuitFlag::new();

        let mut total = 0;
        clock.advance(Duration::from_millis(70));
        total += counter.drain().unwrap();
        clock.advance(Duration::from_millis(30));
        total += counter.drain().unwrap();
        total += counter.wait_for_tr(&quit).unwrap();
        clock.advance(Duration::from_millis(460));
        total += counter.drain().unwrap();

        // Every pulse observed exactly once across drains and waits.
        let elapsed = clock.now();
        let expected = (elapsed.as_nanos() * 10 / TR.as_nanos()) as u64;
        assert_eq!(total, expected);
    }

    #[test]
    fn quit_interrupts_wait_for_tr() {
        let clock = ManualClock::new();
        let quit = QuitFlag::new();
        quit.request();

        let mut counter = counter(&clock, 10);
        assert!(matches!(counter.wait_for_tr(&quit), Err(TaskError::UserQuit)));
    }

    #[test]
    fn wait_for_start_sees_first_pulse() {
        let clock = ManualClock::new();
        let mut counter = counter(&clock, 10);
        let quit = QuitFlag::new();

        counter.wait_for_start(&quit).unwrap();
        // First pulse lands one pulse period after start.
        assert_eq!(clock.now(), TR / 10);
    }
}
