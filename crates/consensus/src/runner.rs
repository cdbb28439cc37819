//! Bounded-concurrency fan-out of independent search attempts.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

use oracle::PromptSet;
use puzzle::{LegalityChecker, PuzzleState};
use search::{ExhaustReason, Oracle, Outcome, SearchConfig, SearchEngine, SearchStats};

use crate::config::AttemptConfig;
use crate::types::{Attempt, RunError};

/// Runs N isolated search attempts from the same initial state.
///
/// Attempts share only read-only collaborators (oracle, checker, prompts);
/// each builds its own tree and frontier. One attempt solving never cancels
/// the others.
#[derive(Debug, Clone)]
pub struct AttemptRunner {
    engine: SearchEngine,
    config: AttemptConfig,
}

impl AttemptRunner {
    pub fn new(engine: SearchEngine, config: AttemptConfig) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self { engine, config })
    }

    /// Validate both configs and build the engine.
    pub fn from_configs(search: SearchConfig, attempts: AttemptConfig) -> Result<Self, RunError> {
        Self::new(SearchEngine::new(search)?, attempts)
    }

    /// Fan-out parameters this runner was validated with.
    pub fn config(&self) -> &AttemptConfig {
        &self.config
    }

    /// Run every attempt to completion or timeout; results sorted by id.
    pub async fn run_all(
        &self,
        oracle: Arc<dyn Oracle>,
        checker: Arc<dyn LegalityChecker>,
        prompts: Arc<PromptSet>,
        initial: &PuzzleState,
    ) -> Vec<Attempt> {
        self.run_all_with(oracle, checker, prompts, initial, |_| {}).await
    }

    /// Like [`run_all`](Self::run_all), calling `on_attempt` as each attempt finishes.
    pub async fn run_all_with<F>(
        &self,
        oracle: Arc<dyn Oracle>,
        checker: Arc<dyn LegalityChecker>,
        prompts: Arc<PromptSet>,
        initial: &PuzzleState,
        mut on_attempt: F,
    ) -> Vec<Attempt>
    where
        F: FnMut(&Attempt),
    {
        let count = self.config.attempt_count;
        let timeout = match self.config.timeout_per_attempt {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        tracing::info!(
            attempts = count,
            concurrency = self.config.concurrency,
            timeout_secs = self.config.timeout_per_attempt,
            "Launching search attempts"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut join_set = JoinSet::new();

        for id in 0..count {
            let semaphore = Arc::clone(&semaphore);
            let oracle = Arc::clone(&oracle);
            let checker = Arc::clone(&checker);
            let prompts = Arc::clone(&prompts);
            let engine = self.engine.clone();
            let initial = initial.clone();

            join_set.spawn(
                async move {
                    // Budget starts once the attempt holds a slot, not while queued.
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return Attempt {
                                id,
                                outcome: Outcome::Failed(format!("concurrency limiter closed: {e}")),
                                stats: SearchStats::default(),
                            }
                        }
                    };
                    tracing::info!("Attempt started");
                    let start = Instant::now();

                    let search = engine.run(oracle.as_ref(), checker.as_ref(), &prompts, &initial);
                    let guarded = AssertUnwindSafe(async {
                        match timeout {
                            Some(limit) => tokio::time::timeout(limit, search).await.ok(),
                            None => Some(search.await),
                        }
                    })
                    .catch_unwind()
                    .await;

                    let attempt = match guarded {
                        Ok(Some(result)) => Attempt {
                            id,
                            outcome: result.outcome,
                            stats: result.stats,
                        },
                        Ok(None) => {
                            tracing::info!(
                                elapsed_s = start.elapsed().as_secs(),
                                "Attempt timed out"
                            );
                            Attempt {
                                id,
                                outcome: Outcome::Exhausted(ExhaustReason::Timeout),
                                stats: SearchStats {
                                    wall_time_ms: start.elapsed().as_millis() as u64,
                                    ..SearchStats::default()
                                },
                            }
                        }
                        Err(_) => {
                            tracing::warn!("Attempt panicked");
                            Attempt {
                                id,
                                outcome: Outcome::Failed("attempt panicked".to_string()),
                                stats: SearchStats {
                                    wall_time_ms: start.elapsed().as_millis() as u64,
                                    ..SearchStats::default()
                                },
                            }
                        }
                    };
                    tracing::info!(
                        outcome = attempt.outcome.label(),
                        time_ms = attempt.stats.wall_time_ms,
                        "Attempt finished"
                    );
                    attempt
                }
                .instrument(tracing::info_span!("attempt", id)),
            );
        }

        let mut attempts = Vec::with_capacity(count);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(attempt) => {
                    on_attempt(&attempt);
                    attempts.push(attempt);
                }
                Err(e) => tracing::warn!(error = %e, "Attempt task did not complete"),
            }
        }

        // Tasks that never reported (cancelled) still count as attempts.
        for id in 0..count {
            if !attempts.iter().any(|a| a.id == id) {
                let attempt = Attempt {
                    id,
                    outcome: Outcome::Failed("attempt task cancelled".to_string()),
                    stats: SearchStats::default(),
                };
                on_attempt(&attempt);
                attempts.push(attempt);
            }
        }

        attempts.sort_by_key(|a| a.id);
        let solved = attempts.iter().filter(|a| a.outcome.is_solved()).count();
        tracing::info!(solved, total = attempts.len(), "All attempts finished");
        attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use puzzle::{Game24, Value};
    use search::mocks::{score_text, thought_text, MockOracle};

    fn root() -> PuzzleState {
        PuzzleState::new([4, 9, 10, 13].into_iter().map(Value::integer).collect()).unwrap()
    }

    fn solving_oracle() -> MockOracle {
        let mut oracle = MockOracle::new();
        oracle.add_propose_response("Current numbers: [4, 9, 10, 13]", vec![thought_text("13 - 9 = 4", &["4", "4", "10"])]);
        oracle.add_propose_response("Current numbers: [4, 4, 10]", vec![thought_text("10 - 4 = 6", &["4", "6"])]);
        oracle.add_propose_response("Current numbers: [4, 6]", vec![thought_text("4 * 6 = 24", &["24"])]);
        oracle.set_critique_default(vec![score_text(0.9, "")]);
        oracle
    }

    fn runner(attempts: AttemptConfig) -> AttemptRunner {
        AttemptRunner::from_configs(SearchConfig::default(), attempts).unwrap()
    }

    #[test]
    fn test_from_configs_rejects_invalid() {
        let bad_attempts = AttemptConfig {
            attempt_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            AttemptRunner::from_configs(SearchConfig::default(), bad_attempts),
            Err(RunError::InvalidConfig(_))
        ));

        let bad_search = SearchConfig {
            score_threshold: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            AttemptRunner::from_configs(bad_search, AttemptConfig::default()),
            Err(RunError::Search(_))
        ));
    }

    #[tokio::test]
    async fn test_all_attempts_reported_in_id_order() {
        let r = runner(AttemptConfig {
            attempt_count: 4,
            concurrency: 2,
            timeout_per_attempt: 0,
        });
        let mut seen = 0;
        let attempts = r
            .run_all_with(
                Arc::new(solving_oracle()),
                Arc::new(Game24::default()),
                Arc::new(PromptSet::default()),
                &root(),
                |_| seen += 1,
            )
            .await;

        assert_eq!(seen, 4);
        let ids: Vec<usize> = attempts.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(attempts.iter().all(|a| a.answer() == Some("24")));
    }

    #[tokio::test]
    async fn test_timeout_is_exhausted_not_failed() {
        let r = runner(AttemptConfig {
            attempt_count: 2,
            concurrency: 2,
            timeout_per_attempt: 1,
        });
        let oracle = solving_oracle().with_delay(Duration::from_secs(5));
        let attempts = r
            .run_all(
                Arc::new(oracle),
                Arc::new(Game24::default()),
                Arc::new(PromptSet::default()),
                &root(),
            )
            .await;

        assert_eq!(attempts.len(), 2);
        for attempt in &attempts {
            assert_eq!(attempt.outcome, Outcome::Exhausted(ExhaustReason::Timeout));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_attempts_in_flight_never_exceed_concurrency() {
        // One oracle call at a time per attempt, so pending calls count running attempts.
        let search = SearchConfig {
            branch_factor: 1,
            candidate_concurrency: 1,
            ..Default::default()
        };
        let attempts = AttemptConfig {
            attempt_count: 6,
            concurrency: 2,
            timeout_per_attempt: 0,
        };
        let r = AttemptRunner::from_configs(search, attempts).unwrap();
        let oracle = Arc::new(solving_oracle().with_delay(Duration::from_millis(10)));

        let results = r
            .run_all(
                oracle.clone(),
                Arc::new(Game24::default()),
                Arc::new(PromptSet::default()),
                &root(),
            )
            .await;

        assert_eq!(results.len(), 6);
        assert!(results.iter().all(|a| a.outcome.is_solved()));
        assert_eq!(oracle.peak_in_flight(), 2);
    }
}
