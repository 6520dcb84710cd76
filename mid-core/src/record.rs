use serde::{Deserialize, Serialize};

use crate::cue::CueType;
use crate::level::AccuracyLevel;
use crate::phase::TrialPhase;

/// Scored result of one trial. `Early` is the sentinel for trials
/// disqualified by a fixation-phase press; it is neither a hit nor a miss,
/// though it pays and trains the staircase as a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Hit,
    Miss,
    Early,
}

impl Score {
    /// True only for a genuine hit; `Early` counts as a miss here.
    pub fn scored_hit(&self) -> bool {
        matches!(self, Score::Hit)
    }

    pub fn is_early(&self) -> bool {
        matches!(self, Score::Early)
    }
}

/// One row per completed trial, append-only. Owned by the scheduler while a
/// trial is in progress and handed to the recording collaborator afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub trial_n: usize,
    /// Condition code 1-9 over the cue x level grid.
    pub trial_type: u8,
    pub cue: CueType,
    pub level: AccuracyLevel,
    /// 1-indexed count of observations this trial's staircase has seen.
    pub stair_n: u32,
    /// Intensity (seconds above the floor duration) presented this trial.
    pub stair_intensity_s: f64,
    /// Posterior SD of the staircase after this trial's update.
    pub stair_sd_s: f64,
    /// Realized target-visible duration in seconds.
    pub target_dur_s: f64,
    pub jitter_s: f64,
    pub score: Score,
    pub early_press: bool,
    /// Seconds from target onset to the scoring press. Present only on hits.
    pub rt_s: Option<f64>,
    /// Presses that neither scored nor raised the early flag.
    pub stray_presses: u32,
    pub reward_delta: i32,
    pub total_earned: i32,
    /// Session-global time of cue onset, seconds.
    pub onset_s: f64,
    pub trial_end_s: f64,
    pub sched_end_s: f64,
    /// Signed (actual - scheduled) at trial end, milliseconds. Diagnostic
    /// only; never fed back into timing.
    pub drift_ms: f64,
    /// Signed drift at each phase transition, milliseconds.
    pub phase_drift_ms: Vec<f64>,
    /// Cumulative pulse count at cue onset.
    pub pulse_ct_onset: u64,
    /// TRs spanned by the trial (5 or 6).
    pub total_trs: u32,
}

/// One row per phase transition, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub trial_n: usize,
    pub phase: TrialPhase,
    /// 1-indexed TR within the trial.
    pub tr_n: u32,
    /// Session-global time at phase start, seconds.
    pub global_time_s: f64,
    /// Time since cue onset at phase start, seconds.
    pub trial_time_s: f64,
    /// Cumulative pulse count at phase start.
    pub pulse_ct: u64,
}

/// Per-level staircase state for the session summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaircaseSnapshot {
    pub level: AccuracyLevel,
    pub intensity_s: f64,
    pub sd_s: f64,
    pub trials: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_is_not_a_scored_hit() {
        assert!(Score::Hit.scored_hit());
        assert!(!Score::Miss.scored_hit());
        assert!(!Score::Early.scored_hit());
        assert!(Score::Early.is_early());
    }
}
