pub mod cue;
pub mod error;
pub mod event;
pub mod level;
pub mod phase;
pub mod record;
pub mod spec;

pub use cue::CueType;
pub use error::{Result, TaskError};
pub use event::{QuitFlag, QuitSignal, ResponseEvent, ResponseSource};
pub use level::AccuracyLevel;
pub use phase::TrialPhase;
pub use record::{PhaseRecord, Score, StaircaseSnapshot, TrialOutcome};
pub use spec::{TrialSpec, validate_sequence};
