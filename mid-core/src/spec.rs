use serde::{Deserialize, Serialize};

use crate::cue::CueType;
use crate::error::{Result, TaskError};
use crate::level::AccuracyLevel;

/// Externally supplied description of one trial. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub cue: CueType,
    pub level: AccuracyLevel,
    /// Inter-trial-interval length in TRs; 1 or 2.
    pub n_iti: u8,
}

impl TrialSpec {
    /// Builds a spec from raw sequence-file fields, validating each.
    pub fn from_raw(row: usize, cue: &str, accuracy_pct: u8, n_iti: u8) -> Result<Self> {
        let cue = CueType::parse(cue).ok_or_else(|| TaskError::MalformedTrialSpec {
            row,
            reason: format!("unknown cue type {cue:?}"),
        })?;
        let level = AccuracyLevel::from_percent(accuracy_pct)?;
        let spec = TrialSpec { cue, level, n_iti };
        spec.validate(row)?;
        Ok(spec)
    }

    pub fn validate(&self, row: usize) -> Result<()> {
        if !(1..=2).contains(&self.n_iti) {
            return Err(TaskError::MalformedTrialSpec {
                row,
                reason: format!("n_iti must be 1 or 2, got {}", self.n_iti),
            });
        }
        Ok(())
    }

    /// Condition code 1-9 over the cue x level grid, in the order the
    /// sequence files use (gain/loss/neutral x high/medium/low).
    pub fn trial_type(&self) -> u8 {
        (self.cue.index() * AccuracyLevel::ALL.len() + self.level.index()) as u8 + 1
    }
}

/// Checks a whole sequence up front so malformed rows surface before any
/// trial begins, never mid-trial.
pub fn validate_sequence(specs: &[TrialSpec]) -> Result<()> {
    for (row, spec) in specs.iter().enumerate() {
        spec.validate(row)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_builds_valid_specs() {
        let spec = TrialSpec::from_raw(0, "gain", 80, 1).unwrap();
        assert_eq!(spec.cue, CueType::Gain);
        assert_eq!(spec.level, AccuracyLevel::High);
        assert_eq!(spec.n_iti, 1);
    }

    #[test]
    fn unknown_cue_is_malformed() {
        assert!(matches!(
            TrialSpec::from_raw(3, "bonus", 80, 1),
            Err(TaskError::MalformedTrialSpec { row: 3, .. })
        ));
    }

    #[test]
    fn unknown_accuracy_is_invalid_level() {
        assert!(matches!(
            TrialSpec::from_raw(0, "gain", 60, 1),
            Err(TaskError::InvalidLevel(60))
        ));
    }

    #[test]
    fn n_iti_outside_one_or_two_is_malformed() {
        assert!(TrialSpec::from_raw(0, "loss", 50, 0).is_err());
        assert!(TrialSpec::from_raw(0, "loss", 50, 3).is_err());
        assert!(TrialSpec::from_raw(0, "loss", 50, 2).is_ok());
    }

    #[test]
    fn trial_type_codes_span_one_to_nine() {
        let mut seen = Vec::new();
        for cue in CueType::ALL {
            for level in AccuracyLevel::ALL {
                let spec = TrialSpec { cue, level, n_iti: 1 };
                seen.push(spec.trial_type());
            }
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn validate_sequence_reports_offending_row() {
        let specs = vec![
            TrialSpec { cue: CueType::Gain, level: AccuracyLevel::High, n_iti: 1 },
            TrialSpec { cue: CueType::Loss, level: AccuracyLevel::Low, n_iti: 4 },
        ];
        assert!(matches!(
            validate_sequence(&specs),
            Err(TaskError::MalformedTrialSpec { row: 1, .. })
        ));
    }
}
