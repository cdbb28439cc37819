//! Majority vote over solved attempts.

use std::cmp::Ordering;

use puzzle::{evaluate_expression, Value};
use search::Outcome;

use crate::types::{Attempt, ConsensusResult};

/// Comparable form of an answer: numeric where possible, else normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnswerKey {
    Number(Value),
    Text(String),
}

/// Canonicalize an answer so numerically equal answers compare equal.
///
/// For `"(10 - 4) * (13 - 9) = 24"` the right-most `=` segment is used.
/// Non-numeric answers fall back to lowercase text with collapsed whitespace.
pub fn canonical_answer(answer: &str) -> AnswerKey {
    let trimmed = answer.trim();
    let segment = trimmed
        .rsplit('=')
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(trimmed);

    if let Ok(value) = Value::parse(segment) {
        return AnswerKey::Number(value);
    }
    if let Some(value) = evaluate_expression(segment) {
        return AnswerKey::Number(value);
    }
    AnswerKey::Text(
        trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
    )
}

/// Solved attempts sharing one canonical answer.
struct Group<'a> {
    key: AnswerKey,
    members: Vec<&'a Attempt>,
}

impl<'a> Group<'a> {
    /// Member with the highest path score; lowest id on ties.
    fn representative(&self) -> &'a Attempt {
        let mut best = self.members[0];
        for &candidate in &self.members[1..] {
            if score(candidate) > score(best) {
                best = candidate;
            }
        }
        best
    }
}

fn score(attempt: &Attempt) -> f64 {
    attempt.path_score().unwrap_or(f64::NEG_INFINITY)
}

/// Rank groups: more votes, then higher representative path score, then lower id.
fn compare(a: &Group<'_>, b: &Group<'_>) -> Ordering {
    let (ra, rb) = (a.representative(), b.representative());
    a.members
        .len()
        .cmp(&b.members.len())
        .then_with(|| score(ra).total_cmp(&score(rb)))
        .then_with(|| rb.id.cmp(&ra.id))
}

/// Reduce attempts to one answer by majority vote.
///
/// Pure and deterministic: the input order does not matter, and calling this
/// twice on the same attempts yields equal results. Confidence counts only
/// solved attempts; with none solved, the result carries no answer.
pub fn aggregate(attempts: &[Attempt]) -> ConsensusResult {
    let mut ordered: Vec<&Attempt> = attempts.iter().collect();
    ordered.sort_by_key(|a| a.id);

    let exhausted = ordered
        .iter()
        .filter(|a| matches!(a.outcome, Outcome::Exhausted(_)))
        .count();
    let failed = ordered
        .iter()
        .filter(|a| matches!(a.outcome, Outcome::Failed(_)))
        .count();

    // Groups in order of first appearance (lowest id first).
    let mut groups: Vec<Group<'_>> = Vec::new();
    for attempt in ordered.iter().copied() {
        let Some(answer) = attempt.answer() else {
            continue;
        };
        let key = canonical_answer(answer);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.members.push(attempt),
            None => groups.push(Group {
                key,
                members: vec![attempt],
            }),
        }
    }

    let solved: usize = groups.iter().map(|g| g.members.len()).sum();
    let total_attempts = attempts.len();

    let Some(winner) = groups.iter().max_by(|a, b| compare(a, b)) else {
        return ConsensusResult {
            answer: None,
            agreeing: 0,
            solved: 0,
            total_attempts,
            reasoning: format!(
                "No attempt solved the puzzle ({exhausted} exhausted, {failed} failed); no consensus."
            ),
            winning_attempt: None,
        };
    };

    let representative = winner.representative();
    let answer = representative.answer().unwrap_or_default().to_string();
    let agreeing = winner.members.len();
    let reasoning = explain(&groups, winner, representative, solved, exhausted, failed);

    ConsensusResult {
        answer: Some(answer),
        agreeing,
        solved,
        total_attempts,
        reasoning,
        winning_attempt: Some(representative.id),
    }
}

fn explain(
    groups: &[Group<'_>],
    winner: &Group<'_>,
    representative: &Attempt,
    solved: usize,
    exhausted: usize,
    failed: usize,
) -> String {
    let mut text = format!(
        "{} of {solved} solved attempts agree on {}.",
        winner.members.len(),
        representative.answer().unwrap_or_default()
    );

    if let Some(solution) = representative.outcome.solution() {
        let steps: Vec<&str> = solution.path.iter().map(|t| t.description.as_str()).collect();
        text.push_str(&format!(
            " Best path (attempt {}, score {:.2}): {}.",
            representative.id,
            solution.path_score,
            if steps.is_empty() {
                "already solved".to_string()
            } else {
                steps.join("; ")
            }
        ));
    }

    let others: Vec<String> = groups
        .iter()
        .filter(|g| g.key != winner.key)
        .map(|g| {
            format!(
                "{} ({})",
                g.representative().answer().unwrap_or_default(),
                g.members.len()
            )
        })
        .collect();
    if !others.is_empty() {
        text.push_str(&format!(" Other answers: {}.", others.join(", ")));
    }

    let tied = groups
        .iter()
        .filter(|g| g.key != winner.key && g.members.len() == winner.members.len())
        .count();
    if tied > 0 {
        text.push_str(" Tie broken by highest path score, then lowest attempt id.");
    }

    if exhausted + failed > 0 {
        text.push_str(&format!(" {exhausted} exhausted, {failed} failed."));
    }
    text
}
