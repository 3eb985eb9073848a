//! Replay configuration
//!
//! Loaded from an optional JSON file, then overridden by command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which lifecycle a replay drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// Full transaction lifecycle over the trace
    #[default]
    Tx,
    /// `on_deploy` only
    Deploy,
    /// `on_redeploy` only
    Redeploy,
}

/// Configuration for a replay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReplayConfig {
    /// Built-in script ids to enable; empty enables all of them
    pub scripts: Vec<String>,
    pub run: RunKind,
    /// Upper bound for the whole run, in milliseconds
    pub timeout_ms: Option<u64>,
    /// Output file; stdout when unset
    pub output: Option<PathBuf>,
    /// Pretty-print the JSON output
    pub pretty: bool,
}

impl ReplayConfig {
    /// Create a configuration enabling `scripts`
    pub fn new<I, S>(scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scripts: scripts.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        tracing::debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn with_run(mut self, run: RunKind) -> Self {
        self.run = run;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            scripts: Vec::new(),
            run: RunKind::Tx,
            timeout_ms: Some(30_000),
            output: None,
            pretty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let config = ReplayConfig::default();
        assert!(config.scripts.is_empty());
        assert_eq!(config.run, RunKind::Tx);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "scripts": ["core.calls"], "run": "redeploy", "pretty": true }"#;
        let config: ReplayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scripts, vec!["core.calls"]);
        assert_eq!(config.run, RunKind::Redeploy);
        assert!(config.pretty);
        assert_eq!(config.timeout_ms, Some(30_000));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir()
            .join(format!("trace-replay-config-{}.json", std::process::id()));
        fs::write(&path, r#"{ "timeoutMs": 250, "output": "out.json" }"#).unwrap();

        let config = ReplayConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ReplayConfig::from_file("/nonexistent/replay.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/replay.json"));
    }
}
