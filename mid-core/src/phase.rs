use serde::{Deserialize, Serialize};

/// The five phases of one trial, in strict order. No skipping, no going back;
/// the ITI phase may repeat once when the trial carries a second ITI TR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialPhase {
    Cue,
    Fixation,
    Response,
    Outcome,
    Iti,
}

impl TrialPhase {
    pub fn next(&self) -> Option<Self> {
        use TrialPhase::*;
        Some(match self {
            Cue => Fixation,
            Fixation => Response,
            Response => Outcome,
            Outcome => Iti,
            Iti => return None,
        })
    }

    /// Only the Response phase accepts a scoring press; presses elsewhere are
    /// either the early-press signal (Fixation) or stray.
    pub fn scores_responses(&self) -> bool {
        matches!(self, TrialPhase::Response)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrialPhase::Cue => "cue",
            TrialPhase::Fixation => "fixation",
            TrialPhase::Response => "response",
            TrialPhase::Outcome => "outcome",
            TrialPhase::Iti => "iti",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_run_in_fixed_order() {
        let mut order = vec![TrialPhase::Cue];
        while let Some(next) = order.last().unwrap().next() {
            order.push(next);
        }
        assert_eq!(
            order,
            vec![
                TrialPhase::Cue,
                TrialPhase::Fixation,
                TrialPhase::Response,
                TrialPhase::Outcome,
                TrialPhase::Iti,
            ]
        );
    }

    #[test]
    fn only_response_scores() {
        assert!(TrialPhase::Response.scores_responses());
        assert!(!TrialPhase::Fixation.scores_responses());
        assert!(!TrialPhase::Iti.scores_responses());
    }
}
