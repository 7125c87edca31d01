//! Suite configuration for contract runs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_URL: &str = "PETCHECK_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "PETCHECK_TIMEOUT_SECS";
pub const ENV_PARALLELISM: &str = "PETCHECK_PARALLELISM";

/// Order placed and read back by the serial Store scenarios.
pub const WELL_KNOWN_ORDER_ID: i64 = 1;

/// Identifier that no scenario ever creates.
pub const MISSING_ID: i64 = 9999;

/// Identifiers scenarios use literally; `fixture_ids` must not cover them.
pub const RESERVED_IDS: [i64; 2] = [WELL_KNOWN_ORDER_ID, MISSING_ID];

/// Suite configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the service under test (including any API prefix)
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Worker threads for independent scenarios
    pub parallelism: usize,

    /// HTTP headers sent with every request (auth, API keys, etc.)
    pub headers: BTreeMap<String, String>,

    /// Directory of extra schema documents overriding the built-in ones
    pub schema_dir: Option<PathBuf>,

    /// Identifier range handed out to fixtures of parallel scenarios
    pub fixture_ids: IdRange,

    /// Maximum number of failing array indices reported per array
    pub array_error_cap: Option<usize>,

    /// Append every step event to a JSONL file
    pub dump_events: bool,

    /// Path of the JSONL event file (default: ".petcheck/events.jsonl")
    pub events_file: Option<PathBuf>,
}

/// Half-open identifier range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdRange {
    pub start: i64,
    pub end: i64,
}

impl IdRange {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[must_use]
    pub const fn contains(&self, id: i64) -> bool {
        id >= self.start && id < self.end
    }
}

impl Default for IdRange {
    fn default() -> Self {
        Self {
            start: 100_000,
            end: 1_000_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v3".to_string(),
            timeout_secs: 10,
            parallelism: 1,
            headers: BTreeMap::new(),
            schema_dir: None,
            fixture_ids: IdRange::default(),
            array_error_cap: None,
            dump_events: false,
            events_file: None,
        }
    }
}

impl Config {
    /// Load config from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load from default location (.petcheck.toml)
    ///
    /// # Errors
    ///
    /// Returns error if a candidate file exists but cannot be loaded
    pub fn load_default() -> Result<Self, ConfigError> {
        let candidates = [".petcheck.toml", ".petcheck.json", "petcheck.toml"];

        for name in candidates {
            let path = Path::new(name);
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Apply `PETCHECK_*` overrides from an environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if a numeric override does not parse
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_TIMEOUT_SECS}={raw}")))?;
        }
        if let Some(raw) = lookup(ENV_PARALLELISM) {
            self.parallelism = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_PARALLELISM}={raw}")))?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn events_path(&self) -> PathBuf {
        self.events_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(".petcheck/events.jsonl"))
    }

    /// Create example config file
    #[must_use]
    pub fn example() -> &'static str {
        r#"# petcheck configuration

# Service under test (Swagger Petstore v3)
base_url = "http://localhost:8080/api/v3"

# Per-request timeout in seconds
timeout_secs = 10

# Worker threads for independent scenarios (serial scenarios always run alone)
parallelism = 4

# Extra schema documents (JSON or YAML, file stem = schema name)
# schema_dir = "schemas"

# Report at most N failing indices per array (unlimited by default)
# array_error_cap = 5

# Append every step event to a JSONL file (default: false)
# dump_events = true
# events_file = ".petcheck/events.jsonl"

# HTTP headers sent with every request
[headers]
# api_key = "special-key"
# Authorization = "Bearer your-token-here"

# Identifier range for fixtures created by parallel scenarios
# (must not include the well-known ids 1 and 9999)
[fixture_ids]
start = 100000
end = 1000000
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid override: {0}")]
    Invalid(String),
}
