use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use mid_experiment::{SessionSummary, TaskConfig};
use serde::Serialize;

/// Per-run output directory and the JSON files written into it.
pub struct RunRecorder {
    dir: PathBuf,
}

#[derive(Serialize)]
struct Manifest<'a> {
    subject_id: &'a str,
    n_trials: usize,
    total_earned: i32,
    completed: bool,
    staircases: &'a [mid_core::StaircaseSnapshot],
    config: &'a TaskConfig,
}

impl RunRecorder {
    /// Creates `base/{subject}_{unix_seconds}/`.
    pub fn create(base: &Path, subject: &str) -> Result<Self> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .context("system clock before unix epoch")?
            .as_secs();
        let dir = base.join(format!("{subject}_{stamp}"));
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating run directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the trial rows, the phase log, and the session manifest.
    pub fn write(
        &self,
        subject: &str,
        config: &TaskConfig,
        summary: &SessionSummary,
    ) -> Result<()> {
        self.write_json("behavioral.json", &summary.outcomes)?;
        self.write_json("scan_log.json", &summary.phases)?;
        self.write_json(
            "session_summary.json",
            &Manifest {
                subject_id: subject,
                n_trials: summary.outcomes.len(),
                total_earned: summary.total_earned,
                completed: summary.completed,
                staircases: &summary.staircases,
                config,
            },
        )
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let file =
            File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), value)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}
