use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use mid_core::{AccuracyLevel, CueType, TrialSpec};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;

/// One row of an external sequence file.
#[derive(Debug, Deserialize)]
struct RawTrial {
    cue_type: String,
    target_accuracy: u8,
    #[serde(default = "default_n_iti")]
    n_iti: u8,
}

fn default_n_iti() -> u8 {
    1
}

/// Reads a JSON sequence file: an array of
/// `{"cue_type": "gain", "target_accuracy": 80, "n_iti": 1}` rows.
pub fn load(path: &Path) -> Result<Vec<TrialSpec>> {
    let file = File::open(path)
        .with_context(|| format!("opening sequence file {}", path.display()))?;
    let rows: Vec<RawTrial> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing sequence file {}", path.display()))?;
    rows.iter()
        .enumerate()
        .map(|(row, raw)| {
            TrialSpec::from_raw(row, &raw.cue_type, raw.target_accuracy, raw.n_iti)
                .map_err(Into::into)
        })
        .collect()
}

/// Built-in balanced sequence: cycles the cue x level grid, with a second
/// ITI TR on a shuffled half of the trials.
pub fn demo(n: usize, rng: &mut StdRng) -> Vec<TrialSpec> {
    let mut specs = Vec::with_capacity(n);
    for i in 0..n {
        specs.push(TrialSpec {
            cue: CueType::ALL[i % 3],
            level: AccuracyLevel::ALL[(i / 3) % 3],
            n_iti: 1,
        });
    }
    let mut extra: Vec<bool> = (0..n).map(|i| i < n / 2).collect();
    extra.shuffle(rng);
    for (spec, extra) in specs.iter_mut().zip(extra) {
        if extra {
            spec.n_iti = 2;
        }
    }
    specs
}
