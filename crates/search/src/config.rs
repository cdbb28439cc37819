use crate::engine::SearchError;

/// Search configuration loaded from TOML.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SearchConfig {
    /// Independent thought proposals requested per expanded state.
    #[serde(default = "default_branch_factor")]
    pub branch_factor: usize,

    /// Thoughts scoring strictly below this are pruned.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// States at this depth are never expanded.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum number of state expansions before giving up.
    #[serde(default = "default_max_expansions")]
    pub max_expansions: u32,

    /// Maximum concurrent oracle calls while expanding one state.
    #[serde(default = "default_candidate_concurrency")]
    pub candidate_concurrency: usize,
}

fn default_branch_factor() -> usize {
    3
}
fn default_score_threshold() -> f64 {
    0.5
}
fn default_max_depth() -> u32 {
    8
}
fn default_max_expansions() -> u32 {
    50
}
fn default_candidate_concurrency() -> usize {
    4
}

impl SearchConfig {
    /// Reject settings the search loop cannot run with.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.branch_factor == 0 {
            return Err(SearchError::InvalidConfig(
                "branch_factor must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(SearchError::InvalidConfig(format!(
                "score_threshold must be within [0, 1], got {}",
                self.score_threshold
            )));
        }
        if self.candidate_concurrency == 0 {
            return Err(SearchError::InvalidConfig(
                "candidate_concurrency must be at least 1".into(),
            ));
        }
        if self.max_expansions == 0 {
            tracing::warn!("max_expansions = 0: every attempt will end Exhausted without expanding");
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            branch_factor: default_branch_factor(),
            score_threshold: default_score_threshold(),
            max_depth: default_max_depth(),
            max_expansions: default_max_expansions(),
            candidate_concurrency: default_candidate_concurrency(),
        }
    }
}
