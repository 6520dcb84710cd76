use std::time::Duration;

use mid_core::{
    PhaseRecord, QuitSignal, ResponseSource, Result, StaircaseSnapshot, TaskError, TrialOutcome,
    TrialSpec, validate_sequence,
};
use mid_timing::{Clock, PulseCounter, PulseSource};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::TaskConfig;
use crate::scheduler::{SessionState, TrialScheduler};
use crate::staircase::StaircaseBank;

/// Everything the session gathered, for the persistence layer to write out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub outcomes: Vec<TrialOutcome>,
    pub phases: Vec<PhaseRecord>,
    pub staircases: Vec<StaircaseSnapshot>,
    pub total_earned: i32,
    /// False when the run ended on a quit signal.
    pub completed: bool,
}

/// One experimental run: owns the staircase bank, the earnings accumulator
/// and the record logs, and passes them to each trial invocation. The pulse
/// source is chosen once at construction; there is no switching mid-session.
pub struct Session<C, S, R, E, Q> {
    clock: C,
    counter: PulseCounter<S, C>,
    bank: StaircaseBank,
    config: TaskConfig,
    responses: E,
    quit: Q,
    rng: R,
    state: SessionState,
}

impl<C, S, R, E, Q> Session<C, S, R, E, Q>
where
    C: Clock,
    S: PulseSource,
    R: Rng,
    E: ResponseSource,
    Q: QuitSignal,
{
    pub fn new(
        config: TaskConfig,
        clock: C,
        source: S,
        responses: E,
        quit: Q,
        rng: R,
    ) -> Result<Self> {
        let counter =
            PulseCounter::new(source, clock.clone(), config.pulses_per_tr, config.poll_interval())?;
        let bank = StaircaseBank::new(&config);
        Ok(Self {
            clock,
            counter,
            bank,
            config,
            responses,
            quit,
            rng,
            state: SessionState::default(),
        })
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Validates the whole sequence, gates on the scanner, runs the opening
    /// fixation, every trial, and the closing fixation. A quit signal ends
    /// the run gracefully; everything gathered so far is preserved in the
    /// summary. Hardware failures and malformed specs terminate with an
    /// error instead.
    pub fn run(&mut self, specs: &[TrialSpec]) -> Result<SessionSummary> {
        validate_sequence(specs)?;

        let completed = match self.run_inner(specs) {
            Ok(()) => true,
            Err(TaskError::UserQuit) => {
                info!("session terminated by quit signal");
                false
            }
            Err(e) => return Err(e),
        };

        let state = std::mem::take(&mut self.state);
        Ok(SessionSummary {
            outcomes: state.outcomes,
            phases: state.phases,
            staircases: self.bank.snapshot(),
            total_earned: state.total_earned,
            completed,
        })
    }

    fn run_inner(&mut self, specs: &[TrialSpec]) -> Result<()> {
        self.counter.start()?;
        self.counter.wait_for_start(&self.quit)?;
        info!("scan start observed");

        self.hold_fixation(self.config.opening_fix_s)?;
        // The drift schedule starts when the trials do.
        self.state.nominal_s = self.clock.now().as_secs_f64();

        for (i, spec) in specs.iter().enumerate() {
            let mut scheduler = TrialScheduler::new(
                &self.clock,
                &mut self.counter,
                &mut self.bank,
                &self.config,
                &mut self.responses,
                &self.quit,
                &mut self.rng,
            );
            scheduler.run_trial(i + 1, spec, &mut self.state)?;
        }

        self.hold_fixation(self.config.closing_fix_s)?;
        Ok(())
    }

    /// Quit-aware fixation hold outside the trial structure. Presses during
    /// a hold are discarded.
    fn hold_fixation(&mut self, dur_s: f64) -> Result<()> {
        let deadline = self.clock.now() + Duration::from_secs_f64(dur_s);
        loop {
            if self.quit.should_quit() {
                return Err(TaskError::UserQuit);
            }
            self.responses.drain();
            let now = self.clock.now();
            if now >= deadline {
                return Ok(());
            }
            self.clock
                .sleep((deadline - now).min(self.config.poll_interval()));
        }
    }
}
