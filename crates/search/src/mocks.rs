//! Mock implementations of search traits for testing without a model server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use oracle::PromptContext;
use puzzle::{LegalityChecker, PuzzleError, PuzzleState, Thought};

use crate::engine::{Oracle, SearchError};

/// Render a well-formed proposal in the oracle's textual contract.
pub fn thought_text(description: &str, remaining: &[&str]) -> String {
    format!("THOUGHT: {description}\nREMAINING: [{}]", remaining.join(", "))
}

/// Render a well-formed critique in the oracle's textual contract.
pub fn score_text(value: f64, critique: &str) -> String {
    format!("SCORE: {value}\nCRITIQUE: {critique}")
}

/// One canned oracle reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Returned as the completion text.
    Text(String),
    /// Returned as `SearchError::Oracle` with this message.
    Error(String),
}

impl From<&str> for MockReply {
    fn from(text: &str) -> Self {
        MockReply::Text(text.to_string())
    }
}

impl From<String> for MockReply {
    fn from(text: String) -> Self {
        MockReply::Text(text)
    }
}

/// Replies served in rotation; the cursor is shared by all callers.
#[derive(Debug, Default)]
struct ReplyCycle {
    replies: Vec<MockReply>,
    next: AtomicUsize,
}

impl ReplyCycle {
    fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            next: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Option<&MockReply> {
        if self.replies.is_empty() {
            return None;
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        self.replies.get(i % self.replies.len())
    }
}

// ---------------------------------------------------------------------------
// MockOracle
// ---------------------------------------------------------------------------

/// Mock oracle returning canned text based on the rendered user message.
///
/// Rules match if the user message *contains* the pattern (first match wins);
/// otherwise the default replies are used. Each rule cycles through its
/// replies, so repeated calls on the same state can differ, as real sampling
/// would.
#[derive(Debug, Default)]
pub struct MockOracle {
    propose_rules: Vec<(String, ReplyCycle)>,
    propose_default: ReplyCycle,
    critique_rules: Vec<(String, ReplyCycle)>,
    critique_default: ReplyCycle,
    delay: Option<Duration>,
    propose_calls: AtomicUsize,
    critique_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockOracle {
    /// Create an empty mock oracle; every call fails until responses are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Proposal replies for states whose prompt contains `pattern`.
    ///
    /// Replaces an earlier rule with the same pattern.
    pub fn add_propose_response<I>(&mut self, pattern: &str, replies: I)
    where
        I: IntoIterator,
        I::Item: Into<MockReply>,
    {
        upsert(&mut self.propose_rules, pattern, collect(replies));
    }

    /// Critique replies for prompts containing `pattern` (e.g. `"THOUGHT: 13 - 9 = 4"`).
    pub fn add_critique_response<I>(&mut self, pattern: &str, replies: I)
    where
        I: IntoIterator,
        I::Item: Into<MockReply>,
    {
        upsert(&mut self.critique_rules, pattern, collect(replies));
    }

    /// Proposal replies when no rule matches.
    pub fn set_propose_default<I>(&mut self, replies: I)
    where
        I: IntoIterator,
        I::Item: Into<MockReply>,
    {
        self.propose_default = ReplyCycle::new(collect(replies));
    }

    /// Critique replies when no rule matches.
    pub fn set_critique_default<I>(&mut self, replies: I)
    where
        I: IntoIterator,
        I::Item: Into<MockReply>,
    {
        self.critique_default = ReplyCycle::new(collect(replies));
    }

    /// Sleep this long before every reply (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn propose_calls(&self) -> usize {
        self.propose_calls.load(Ordering::Relaxed)
    }

    pub fn critique_calls(&self) -> usize {
        self.critique_calls.load(Ordering::Relaxed)
    }

    /// Most propose/critique calls that were ever pending at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn reply(
        &self,
        rules: &[(String, ReplyCycle)],
        default: &ReplyCycle,
        context: &PromptContext,
    ) -> Result<String, SearchError> {
        let _guard = InFlight::enter(&self.in_flight, &self.peak_in_flight);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = rules
            .iter()
            .find(|(pattern, _)| context.user.contains(pattern.as_str()))
            .and_then(|(_, cycle)| cycle.next())
            .or_else(|| default.next());
        match reply {
            Some(MockReply::Text(text)) => Ok(text.clone()),
            Some(MockReply::Error(msg)) => Err(SearchError::Oracle(anyhow::anyhow!(msg.clone()))),
            None => Err(SearchError::Oracle(anyhow::anyhow!(
                "MockOracle: no canned reply for prompt"
            ))),
        }
    }
}

/// Counts one pending call until dropped, so cancelled calls are released too.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(current)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn collect<I>(replies: I) -> Vec<MockReply>
where
    I: IntoIterator,
    I::Item: Into<MockReply>,
{
    replies.into_iter().map(Into::into).collect()
}

fn upsert(rules: &mut Vec<(String, ReplyCycle)>, pattern: &str, replies: Vec<MockReply>) {
    let cycle = ReplyCycle::new(replies);
    match rules.iter_mut().find(|(p, _)| p == pattern) {
        Some(rule) => rule.1 = cycle,
        None => rules.push((pattern.to_string(), cycle)),
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn propose(&self, context: &PromptContext) -> Result<String, SearchError> {
        self.propose_calls.fetch_add(1, Ordering::Relaxed);
        self.reply(&self.propose_rules, &self.propose_default, context).await
    }

    async fn critique(&self, context: &PromptContext) -> Result<String, SearchError> {
        self.critique_calls.fetch_add(1, Ordering::Relaxed);
        self.reply(&self.critique_rules, &self.critique_default, context).await
    }
}

// ---------------------------------------------------------------------------
// FailingChecker
// ---------------------------------------------------------------------------

/// Checker whose legality test always errors; nothing is ever terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingChecker;

impl LegalityChecker for FailingChecker {
    fn describe(&self) -> String {
        "Reach 24.".to_string()
    }

    fn is_legal(&self, _state: &PuzzleState, _thought: &Thought) -> Result<bool, PuzzleError> {
        Err(PuzzleError::Checker("rule table unavailable".into()))
    }

    fn is_terminal(&self, _state: &PuzzleState) -> Result<bool, PuzzleError> {
        Ok(false)
    }

    fn extract_answer(&self, state: &PuzzleState) -> Result<String, PuzzleError> {
        Err(PuzzleError::NotTerminal(state.remaining_text().join(", ")))
    }
}
