use crate::types::RunError;

/// Attempt fan-out configuration loaded from TOML.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AttemptConfig {
    /// Independent search attempts per puzzle.
    #[serde(default = "default_attempt_count")]
    pub attempt_count: usize,

    /// Attempts in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Wall-clock budget per attempt in seconds. 0 = no timeout.
    #[serde(default = "default_timeout_per_attempt")]
    pub timeout_per_attempt: u64,
}

fn default_attempt_count() -> usize {
    5
}
fn default_concurrency() -> usize {
    5
}
fn default_timeout_per_attempt() -> u64 {
    120
}

impl AttemptConfig {
    pub fn validate(&self) -> Result<(), RunError> {
        if self.attempt_count == 0 {
            return Err(RunError::InvalidConfig(
                "attempt_count must be at least 1".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(RunError::InvalidConfig(
                "concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            attempt_count: default_attempt_count(),
            concurrency: default_concurrency(),
            timeout_per_attempt: default_timeout_per_attempt(),
        }
    }
}
