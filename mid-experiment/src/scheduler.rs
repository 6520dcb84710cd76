use std::time::Duration;

use mid_core::{
    PhaseRecord, QuitSignal, ResponseEvent, ResponseSource, Result, Score, TaskError,
    TrialOutcome, TrialPhase, TrialSpec,
};
use mid_timing::{Clock, PulseCounter, PulseSource};
use rand::Rng;
use tracing::{debug, info};

use crate::config::TaskConfig;
use crate::staircase::StaircaseBank;

/// Session-lifetime state threaded through every trial: the earnings
/// accumulator, the drift schedule keeper, the cumulative pulse count, and
/// the append-only record logs. Owned by the session, mutated only by the
/// scheduler while a trial runs.
#[derive(Debug, Default)]
pub struct SessionState {
    pub total_earned: i32,
    /// Scheduled cumulative time: sum of nominal phase durations since the
    /// trials began. Drift is measured against this, never corrected.
    pub nominal_s: f64,
    pub pulse_ct: u64,
    pub outcomes: Vec<TrialOutcome>,
    pub phases: Vec<PhaseRecord>,
}

/// One completed phase: when it started and every press observed during it.
struct PhaseWindow {
    start: Duration,
    events: Vec<ResponseEvent>,
}

/// Drives one trial through Cue -> Fixation -> Response -> Outcome -> ITI.
///
/// Every phase body is a single polling loop racing the nominal deadline
/// against the response and quit sources; a phase then ends at
/// max(nominal elapsed, next TR boundary), so wall-clock timing is
/// cross-checked against the pulse stream and any disagreement lands in the
/// drift fields instead of being silently absorbed. One `PhaseRecord` is
/// committed per completed phase; a phase abandoned by quit commits nothing.
pub struct TrialScheduler<'a, C, S, R, E, Q> {
    clock: &'a C,
    counter: &'a mut PulseCounter<S, C>,
    bank: &'a mut StaircaseBank,
    config: &'a TaskConfig,
    responses: &'a mut E,
    quit: &'a Q,
    rng: &'a mut R,
}

impl<'a, C, S, R, E, Q> TrialScheduler<'a, C, S, R, E, Q>
where
    C: Clock,
    S: PulseSource,
    R: Rng,
    E: ResponseSource,
    Q: QuitSignal,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock: &'a C,
        counter: &'a mut PulseCounter<S, C>,
        bank: &'a mut StaircaseBank,
        config: &'a TaskConfig,
        responses: &'a mut E,
        quit: &'a Q,
        rng: &'a mut R,
    ) -> Self {
        Self { clock, counter, bank, config, responses, quit, rng }
    }

    /// Runs one trial, committing records into `state` as they settle.
    /// `TaskError::UserQuit` abandons the trial; whatever was committed
    /// before the quit stays valid.
    pub fn run_trial(
        &mut self,
        trial_n: usize,
        spec: &TrialSpec,
        state: &mut SessionState,
    ) -> Result<()> {
        let intensity_s = self.bank.intensity_for(spec.level);
        let target_dur_s = self.bank.duration_for(spec.level);
        let jitter_s = if self.config.jitter_max_s > 0.0 {
            self.rng.random_range(0.0..self.config.jitter_max_s)
        } else {
            0.0
        };

        info!(
            trial_n,
            cue = spec.cue.name(),
            level = spec.level.name(),
            target_ms = (target_dur_s * 1000.0).round() as i64,
            jitter_ms = (jitter_s * 1000.0).round() as i64,
            "trial start"
        );

        let mut drifts: Vec<f64> = Vec::new();
        let mut stray: u32 = 0;
        let mut tr_n: u32 = 0;

        // Cue. Presses here are never scored.
        state.pulse_ct += self.counter.drain()?;
        let trial_onset = self.clock.now();
        let pulse_ct_onset = state.pulse_ct;
        tr_n += 1;
        let cue = self.run_phase(trial_n, TrialPhase::Cue, tr_n, trial_onset, state, &mut drifts)?;
        stray += cue.events.len() as u32;

        // Fixation. Any press here disqualifies the trial from scoring.
        tr_n += 1;
        let fixation =
            self.run_phase(trial_n, TrialPhase::Fixation, tr_n, trial_onset, state, &mut drifts)?;
        let fix_presses = fixation
            .events
            .iter()
            .filter(|e| e.at >= fixation.start)
            .count();
        stray += (fixation.events.len() - fix_presses) as u32;
        stray += fix_presses.saturating_sub(1) as u32;
        let early_press = fix_presses > 0;

        // Response. The target is visible in [onset, onset + duration); the
        // first press in the phase is the single scoring event.
        tr_n += 1;
        let response =
            self.run_phase(trial_n, TrialPhase::Response, tr_n, trial_onset, state, &mut drifts)?;
        let onset = response.start + Duration::from_secs_f64(jitter_s);
        let visible_until = onset + Duration::from_secs_f64(target_dur_s);
        let in_phase: Vec<&ResponseEvent> = response
            .events
            .iter()
            .filter(|e| e.at >= response.start)
            .collect();
        stray += (response.events.len() - in_phase.len()) as u32;

        let (score, rt_s) = if early_press {
            stray += in_phase.len() as u32;
            (Score::Early, None)
        } else if let Some(press) = in_phase.first() {
            stray += (in_phase.len() - 1) as u32;
            if press.at >= onset && press.at < visible_until {
                (Score::Hit, Some((press.at - onset).as_secs_f64()))
            } else {
                (Score::Miss, None)
            }
        } else {
            (Score::Miss, None)
        };

        // Outcome. Reward settles and the staircase sees its one observation;
        // an early press trains it as a miss.
        let reward_delta = spec.cue.reward_delta(score, self.config.reward);
        state.total_earned += reward_delta;
        self.bank.record_response(spec.level, score.scored_hit());
        let stair = self.bank.stair(spec.level);
        let stair_sd_s = stair.sd();
        let stair_n = stair.trials();

        tr_n += 1;
        let outcome =
            self.run_phase(trial_n, TrialPhase::Outcome, tr_n, trial_onset, state, &mut drifts)?;
        stray += outcome.events.len() as u32;

        // ITI. One fixation sub-phase per configured TR.
        for _ in 0..spec.n_iti {
            tr_n += 1;
            let iti =
                self.run_phase(trial_n, TrialPhase::Iti, tr_n, trial_onset, state, &mut drifts)?;
            stray += iti.events.len() as u32;
        }

        let trial_end_s = self.now_s();
        let sched_end_s = state.nominal_s;
        let drift_ms = (trial_end_s - sched_end_s) * 1000.0;

        info!(
            trial_n,
            score = ?score,
            reward_delta,
            total = state.total_earned,
            drift_ms,
            "trial end"
        );

        state.outcomes.push(TrialOutcome {
            trial_n,
            trial_type: spec.trial_type(),
            cue: spec.cue,
            level: spec.level,
            stair_n,
            stair_intensity_s: intensity_s,
            stair_sd_s,
            target_dur_s,
            jitter_s,
            score,
            early_press,
            rt_s,
            stray_presses: stray,
            reward_delta,
            total_earned: state.total_earned,
            onset_s: trial_onset.as_secs_f64(),
            trial_end_s,
            sched_end_s,
            drift_ms,
            phase_drift_ms: drifts,
            pulse_ct_onset,
            total_trs: tr_n,
        });

        Ok(())
    }

    /// Runs one phase to completion: nominal-duration poll window, then the
    /// TR catch-up, then the record commit.
    fn run_phase(
        &mut self,
        trial_n: usize,
        phase: TrialPhase,
        tr_n: u32,
        trial_onset: Duration,
        state: &mut SessionState,
        drifts: &mut Vec<f64>,
    ) -> Result<PhaseWindow> {
        let start = self.clock.now();
        let pulse_at_start = state.pulse_ct;
        let nominal_s = self.config.phase_nominal_s(phase);

        let events = self.run_phase_window(Duration::from_secs_f64(nominal_s))?;

        // The phase ends at max(nominal elapsed, next TR boundary).
        state.pulse_ct += self.counter.wait_for_tr(self.quit)?;
        state.nominal_s += nominal_s;
        drifts.push((self.now_s() - state.nominal_s) * 1000.0);

        debug!(
            trial_n,
            phase = phase.name(),
            tr_n,
            pulse_ct = pulse_at_start,
            "phase complete"
        );

        state.phases.push(PhaseRecord {
            trial_n,
            phase,
            tr_n,
            global_time_s: start.as_secs_f64(),
            trial_time_s: (start - trial_onset).as_secs_f64(),
            pulse_ct: pulse_at_start,
        });

        Ok(PhaseWindow { start, events })
    }

    /// The cooperative wait at the heart of each phase: polls the response
    /// source and the quit signal on a short sleep until the nominal
    /// duration elapses. Responses never shorten the wait; quit aborts it.
    fn run_phase_window(&mut self, nominal: Duration) -> Result<Vec<ResponseEvent>> {
        let start = self.clock.now();
        let deadline = start + nominal;
        let mut events = Vec::new();
        loop {
            if self.quit.should_quit() {
                return Err(TaskError::UserQuit);
            }
            while let Some(ev) = self.responses.poll() {
                events.push(ev);
            }
            let now = self.clock.now();
            if now >= deadline {
                break;
            }
            self.clock.sleep((deadline - now).min(self.config.poll_interval()));
        }
        Ok(events)
    }

    fn now_s(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }
}
