//! Step/scenario event dump to a JSONL file
//!
//! Appends one JSON object per event for post-hoc analysis and audit trails:
//!
//! ```text
//! {"event":"step","scenario":"Add pet","step":"POST /pet","kind":"send",...}
//! {"event":"scenario","title":"Add pet","feature":"Pet","outcome":"passed",...}
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::{ReportSink, ScenarioReport, StepEvent};

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Step(&'a StepEvent),
    Scenario(&'a ScenarioReport),
}

/// Appends every event as one JSON line.
///
/// Write failures are logged and dropped; a broken dump never changes a
/// scenario outcome.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Open (or create) `path` for appending, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, record: &Record<'_>) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot serialize event");
                return;
            }
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let result = writeln!(writer, "{line}").and_then(|()| writer.flush());
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "cannot write event");
        }
    }
}

impl ReportSink for JsonlSink {
    fn on_step(&self, event: &StepEvent) {
        self.write(&Record::Step(event));
    }

    fn on_scenario(&self, report: &ScenarioReport) {
        self.write(&Record::Scenario(report));
    }
}
