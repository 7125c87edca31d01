//! Run artifacts written under `--report-dir`
//!
//! `config.toml` (headers masked), `summary.json` (verdict, counts and every
//! scenario report) and, when anything did not pass, `reproductions.http`.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use petcheck_core::report::{mask_headers, to_http_file};
use petcheck_core::{Config, Outcome, SuiteReport};

/// Everything needed to persist one run.
pub struct RunArtifacts<'a> {
    pub config: &'a Config,
    pub report: &'a SuiteReport,
}

/// Write the artifacts into `dir`, creating it if needed.
///
/// Returns the paths written.
pub fn save_report(dir: &Path, data: &RunArtifacts<'_>) -> Result<Vec<PathBuf>, std::io::Error> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let snapshot = Config {
        headers: mask_headers(&data.config.headers),
        ..data.config.clone()
    };
    let config_toml =
        toml::to_string_pretty(&snapshot).map_err(|e| std::io::Error::other(e.to_string()))?;
    written.push(write(dir, "config.toml", &config_toml)?);

    let verdict = data.report.verdict();
    let summary = serde_json::json!({
        "verdict": verdict,
        "counts": data.report.counts(),
        "meta": {
            "finished_at_unix": unix_now(),
            "duration_ms": data.report.duration_ms,
            "base_url": data.config.base_url,
            "parallelism": data.config.parallelism,
        },
        "scenarios": data.report.scenarios,
    });
    let summary =
        serde_json::to_string_pretty(&summary).map_err(|e| std::io::Error::other(e.to_string()))?;
    written.push(write(dir, "summary.json", &summary)?);

    if data.report.scenarios.iter().any(|s| s.outcome != Outcome::Passed) {
        let http = to_http_file(&data.report.scenarios, &data.config.headers);
        written.push(write(dir, "reproductions.http", &http)?);
    }

    Ok(written)
}

fn write(dir: &Path, name: &str, content: &str) -> Result<PathBuf, std::io::Error> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
