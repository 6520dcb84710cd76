use mid_core::{AccuracyLevel, StaircaseSnapshot};

use crate::config::TaskConfig;

/// Grid resolution of the threshold posterior.
const GRID_POINTS: usize = 201;
/// Chance of a hit with no visible target at all.
const GUESS_RATE: f64 = 0.01;
/// Chance of a miss however long the target stays up.
const LAPSE_RATE: f64 = 0.01;
/// Logistic slope of the psychometric function, in seconds of intensity.
const SLOPE_S: f64 = 0.05;

/// Bayesian staircase over target intensity (seconds of visibility above the
/// floor duration), one per accuracy level. A posterior over candidate
/// thresholds starts at a Gaussian prior and is multiplied by the likelihood
/// of each observed hit/miss; the next proposed intensity is the posterior
/// mean. The threshold is defined at the level's target hit proportion, so
/// the estimate settles where the subject hits at that rate: hits pull the
/// proposal down, misses push it up.
///
/// Placement is deterministic (posterior mean), so runs are reproducible
/// without seeding the estimator itself.
#[derive(Debug, Clone)]
pub struct Staircase {
    grid: Vec<f64>,
    log_posterior: Vec<f64>,
    offset_s: f64,
    min_intensity_s: f64,
    max_intensity_s: f64,
    trials: u32,
}

/// Hit probability at intensity `x` for a subject whose threshold is `t`.
/// `offset` shifts the curve so that p(t) equals the level's target rate.
fn hit_probability(x: f64, t: f64, offset: f64) -> f64 {
    let z = (x - t + offset) / SLOPE_S;
    GUESS_RATE + (1.0 - GUESS_RATE - LAPSE_RATE) / (1.0 + (-z).exp())
}

impl Staircase {
    /// `target` is the hit proportion to converge toward; the prior is
    /// Gaussian with the given mean and SD over `[min, max]` intensity.
    pub fn new(initial_s: f64, sd_s: f64, target: f64, min_s: f64, max_s: f64) -> Self {
        let step = (max_s - min_s) / (GRID_POINTS - 1) as f64;
        let grid: Vec<f64> = (0..GRID_POINTS).map(|i| min_s + step * i as f64).collect();
        let log_posterior = grid
            .iter()
            .map(|&t| {
                let d = (t - initial_s) / sd_s;
                -0.5 * d * d
            })
            .collect();

        let q = (target - GUESS_RATE) / (1.0 - GUESS_RATE - LAPSE_RATE);
        let offset_s = SLOPE_S * (q / (1.0 - q)).ln();

        Self {
            grid,
            log_posterior,
            offset_s,
            min_intensity_s: min_s,
            max_intensity_s: max_s,
            trials: 0,
        }
    }

    pub fn from_config(config: &TaskConfig, level: AccuracyLevel) -> Self {
        Self::new(
            config.initial_intensity_s(),
            config.initial_sd_s,
            level.target_proportion(),
            0.0,
            config.max_intensity_s(),
        )
    }

    /// Best-estimate intensity, clamped to the estimator bounds.
    pub fn current_intensity(&self) -> f64 {
        self.posterior_mean()
            .clamp(self.min_intensity_s, self.max_intensity_s)
    }

    /// Folds one observation in at the currently proposed intensity.
    pub fn update(&mut self, hit: bool) {
        let x = self.current_intensity();
        let offset = self.offset_s;
        for (lp, &t) in self.log_posterior.iter_mut().zip(self.grid.iter()) {
            let p = hit_probability(x, t, offset);
            *lp += if hit { p.ln() } else { (1.0 - p).ln() };
        }
        // Rescale so long runs cannot underflow the log domain.
        let top = self
            .log_posterior
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        for lp in &mut self.log_posterior {
            *lp -= top;
        }
        self.trials += 1;
    }

    /// Posterior standard deviation, the step-size analogue.
    pub fn sd(&self) -> f64 {
        let (mean, weights) = self.moments();
        let var = self
            .grid
            .iter()
            .zip(weights.iter())
            .map(|(&t, &w)| w * (t - mean) * (t - mean))
            .sum::<f64>();
        var.sqrt()
    }

    pub fn trials(&self) -> u32 {
        self.trials
    }

    fn posterior_mean(&self) -> f64 {
        self.moments().0
    }

    fn moments(&self) -> (f64, Vec<f64>) {
        let mut weights: Vec<f64> = self.log_posterior.iter().map(|&lp| lp.exp()).collect();
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        let mean = self
            .grid
            .iter()
            .zip(weights.iter())
            .map(|(&t, &w)| t * w)
            .sum();
        (mean, weights)
    }
}

/// Owns the three estimators, keyed by accuracy level, and is the only
/// writer to them. One lives for the whole session per level; updating one
/// never touches another.
#[derive(Debug, Clone)]
pub struct StaircaseBank {
    floor_s: f64,
    min_dur_s: f64,
    max_dur_s: f64,
    stairs: [Staircase; 3],
}

impl StaircaseBank {
    pub fn new(config: &TaskConfig) -> Self {
        Self {
            floor_s: config.min_target_dur_s,
            min_dur_s: config.min_target_dur_s,
            max_dur_s: config.max_target_dur_s,
            stairs: AccuracyLevel::ALL.map(|level| Staircase::from_config(config, level)),
        }
    }

    pub fn stair(&self, level: AccuracyLevel) -> &Staircase {
        &self.stairs[level.index()]
    }

    pub fn intensity_for(&self, level: AccuracyLevel) -> f64 {
        self.stair(level).current_intensity()
    }

    /// Floor plus the level's current intensity, re-clamped to the
    /// session-wide duration bounds. Both this clamp and the estimator's own
    /// hold at once.
    pub fn duration_for(&self, level: AccuracyLevel) -> f64 {
        (self.floor_s + self.intensity_for(level)).clamp(self.min_dur_s, self.max_dur_s)
    }

    /// Records one scored observation for the level. Called exactly once per
    /// trial, from the Outcome phase.
    pub fn record_response(&mut self, level: AccuracyLevel, hit: bool) {
        self.stairs[level.index()].update(hit);
    }

    pub fn snapshot(&self) -> Vec<StaircaseSnapshot> {
        AccuracyLevel::ALL
            .iter()
            .map(|&level| {
                let stair = self.stair(level);
                StaircaseSnapshot {
                    level,
                    intensity_s: stair.current_intensity(),
                    sd_s: stair.sd(),
                    trials: stair.trials(),
                }
            })
            .collect()
    }
}
