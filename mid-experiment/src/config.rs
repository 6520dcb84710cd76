use std::time::Duration;

use mid_core::TrialPhase;
use serde::{Deserialize, Serialize};

/// All task constants, in seconds unless the name says otherwise. Defaults
/// match the study parameters of the long MID protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub cue_s: f64,
    pub fixation_s: f64,
    pub response_s: f64,
    pub outcome_s: f64,
    /// Duration of one ITI TR; a trial runs 1 or 2 of these.
    pub iti_s: f64,

    /// Opening fixation hold, until field homogeneity is reached.
    pub opening_fix_s: f64,
    /// Closing fixation hold, so the last trials' responses stay modelable.
    pub closing_fix_s: f64,

    pub min_target_dur_s: f64,
    pub max_target_dur_s: f64,
    pub initial_target_dur_s: f64,
    pub initial_sd_s: f64,
    pub jitter_max_s: f64,

    /// Dollars moved by one gain hit or loss miss.
    pub reward: i32,

    pub pulses_per_tr: u64,
    pub tr_s: f64,
    pub poll_interval_ms: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            cue_s: 2.0,
            fixation_s: 2.0,
            response_s: 2.0,
            outcome_s: 2.0,
            iti_s: 2.0,
            opening_fix_s: 12.0,
            closing_fix_s: 8.0,
            min_target_dur_s: 0.130,
            max_target_dur_s: 0.500,
            initial_target_dur_s: 0.265,
            initial_sd_s: 0.067,
            jitter_max_s: 0.05,
            reward: 5,
            pulses_per_tr: 46,
            tr_s: 2.0,
            poll_interval_ms: 1,
        }
    }
}

impl TaskConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn tr(&self) -> Duration {
        Duration::from_secs_f64(self.tr_s)
    }

    /// Highest intensity the staircases may propose.
    pub fn max_intensity_s(&self) -> f64 {
        self.max_target_dur_s - self.min_target_dur_s
    }

    /// Prior mean intensity, above the floor duration.
    pub fn initial_intensity_s(&self) -> f64 {
        self.initial_target_dur_s - self.min_target_dur_s
    }

    pub fn phase_nominal_s(&self, phase: TrialPhase) -> f64 {
        match phase {
            TrialPhase::Cue => self.cue_s,
            TrialPhase::Fixation => self.fixation_s,
            TrialPhase::Response => self.response_s,
            TrialPhase::Outcome => self.outcome_s,
            TrialPhase::Iti => self.iti_s,
        }
    }
}
