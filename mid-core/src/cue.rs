use serde::{Deserialize, Serialize};

use crate::record::Score;

/// Incentive condition signalled at the start of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueType {
    Gain,
    Loss,
    Neutral,
}

impl CueType {
    pub const ALL: [CueType; 3] = [CueType::Gain, CueType::Loss, CueType::Neutral];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gain" => Some(CueType::Gain),
            "loss" => Some(CueType::Loss),
            "neutral" => Some(CueType::Neutral),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CueType::Gain => "gain",
            CueType::Loss => "loss",
            CueType::Neutral => "neutral",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            CueType::Gain => 0,
            CueType::Loss => 1,
            CueType::Neutral => 2,
        }
    }

    /// Payoff table. Gain pays on a hit, loss charges on a miss, neutral
    /// never moves earnings. An early press pays as a miss.
    pub fn reward_delta(&self, score: Score, magnitude: i32) -> i32 {
        match (self, score.scored_hit()) {
            (CueType::Gain, true) => magnitude,
            (CueType::Gain, false) => 0,
            (CueType::Loss, true) => 0,
            (CueType::Loss, false) => -magnitude,
            (CueType::Neutral, _) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payoff_table_covers_all_conditions() {
        let m = 5;
        assert_eq!(CueType::Gain.reward_delta(Score::Hit, m), 5);
        assert_eq!(CueType::Gain.reward_delta(Score::Miss, m), 0);
        assert_eq!(CueType::Loss.reward_delta(Score::Hit, m), 0);
        assert_eq!(CueType::Loss.reward_delta(Score::Miss, m), -5);
        assert_eq!(CueType::Neutral.reward_delta(Score::Hit, m), 0);
        assert_eq!(CueType::Neutral.reward_delta(Score::Miss, m), 0);
    }

    #[test]
    fn early_press_pays_as_miss() {
        assert_eq!(CueType::Gain.reward_delta(Score::Early, 5), 0);
        assert_eq!(CueType::Loss.reward_delta(Score::Early, 5), -5);
        assert_eq!(CueType::Neutral.reward_delta(Score::Early, 5), 0);
    }

    #[test]
    fn parse_accepts_known_names_only() {
        assert_eq!(CueType::parse("gain"), Some(CueType::Gain));
        assert_eq!(CueType::parse(" Loss "), Some(CueType::Loss));
        assert_eq!(CueType::parse("reward"), None);
    }
}
