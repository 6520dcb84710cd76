use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskError};

/// Target accuracy level for a trial. Exactly three levels exist for the
/// lifetime of a session, each backed by its own staircase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyLevel {
    High,
    Medium,
    Low,
}

impl AccuracyLevel {
    pub const ALL: [AccuracyLevel; 3] = [
        AccuracyLevel::High,
        AccuracyLevel::Medium,
        AccuracyLevel::Low,
    ];

    /// Maps a raw percent value onto a level. Anything outside the fixed set
    /// is a programmer/data error.
    pub fn from_percent(pct: u8) -> Result<Self> {
        match pct {
            80 => Ok(AccuracyLevel::High),
            50 => Ok(AccuracyLevel::Medium),
            20 => Ok(AccuracyLevel::Low),
            other => Err(TaskError::InvalidLevel(other)),
        }
    }

    pub fn percent(&self) -> u8 {
        match self {
            AccuracyLevel::High => 80,
            AccuracyLevel::Medium => 50,
            AccuracyLevel::Low => 20,
        }
    }

    /// Target hit proportion the staircase converges toward.
    pub fn target_proportion(&self) -> f64 {
        f64::from(self.percent()) / 100.0
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccuracyLevel::High => "high",
            AccuracyLevel::Medium => "medium",
            AccuracyLevel::Low => "low",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            AccuracyLevel::High => 0,
            AccuracyLevel::Medium => 1,
            AccuracyLevel::Low => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_percent_round_trips() {
        for level in AccuracyLevel::ALL {
            assert_eq!(AccuracyLevel::from_percent(level.percent()).unwrap(), level);
        }
    }

    #[test]
    fn from_percent_rejects_unknown_levels() {
        assert!(matches!(
            AccuracyLevel::from_percent(75),
            Err(TaskError::InvalidLevel(75))
        ));
    }

    #[test]
    fn target_proportions() {
        assert_eq!(AccuracyLevel::High.target_proportion(), 0.8);
        assert_eq!(AccuracyLevel::Medium.target_proportion(), 0.5);
        assert_eq!(AccuracyLevel::Low.target_proportion(), 0.2);
    }
}
