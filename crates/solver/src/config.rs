//! TOML config loading for the solve CLI.
//!
//! Deserializes `configs/solve.toml` which has `[search]`, `[attempts]` and
//! `[oracle]` sections, then merges with CLI overrides.

use std::path::Path;

use consensus::AttemptConfig;
use oracle::OracleConfig;
use search::SearchConfig;
use serde::Deserialize;

/// Config file used when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "configs/solve.toml";

/// Top-level structure matching `configs/solve.toml`.
///
/// Every section is optional; missing sections take their defaults.
#[derive(Debug, Default, Deserialize)]
pub struct SolveToml {
    /// Search algorithm parameters.
    #[serde(default)]
    pub search: SearchConfig,
    /// Attempt fan-out parameters.
    #[serde(default)]
    pub attempts: AttemptConfig,
    /// Oracle server and prompt settings.
    #[serde(default)]
    pub oracle: OracleConfig,
}

/// CLI flags that override TOML values.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub server_url: Option<String>,
    pub attempts: Option<usize>,
    pub concurrency: Option<usize>,
}

/// Load and deserialize a `SolveToml` from a TOML file.
pub fn load_solve_toml(path: &Path) -> anyhow::Result<SolveToml> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {e}", path.display()))?;
    let config: SolveToml = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded solve config");
    Ok(config)
}

/// Load the explicit config, else the default file if present, else defaults.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<SolveToml> {
    match path {
        Some(path) => load_solve_toml(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_solve_toml(default_path)
            } else {
                tracing::info!("No config file, using built-in defaults");
                Ok(SolveToml::default())
            }
        }
    }
}

/// Apply CLI overrides on top of file values.
///
/// Priority chain: serde defaults < TOML values < CLI flags.
pub fn apply_overrides(config: &mut SolveToml, overrides: &CliOverrides) {
    if let Some(url) = &overrides.server_url {
        config.oracle.server_url = url.clone();
    }
    if let Some(n) = overrides.attempts {
        config.attempts.attempt_count = n;
    }
    if let Some(n) = overrides.concurrency {
        config.attempts.concurrency = n;
    }
}
