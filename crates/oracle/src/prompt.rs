//! Prompt templates, prompt rendering, and reply parsing.
//!
//! Replies follow a line-oriented contract:
//!
//! ```text
//! THOUGHT: 13 - 9 = 4
//! REMAINING: [4, 4, 10]
//! ```
//!
//! ```text
//! SCORE: 0.7
//! CRITIQUE: Subtracting 9 from 13 gives a useful building block.
//! ```
//!
//! Labels are matched case-insensitively at the start of a line, tolerating
//! leading whitespace and markdown emphasis (`**THOUGHT:**`).

use serde::Deserialize;

use crate::types::{ParsedScore, ParsedThought};

const GENERATOR_PROMPT: &str = "You are a creative problem-solving assistant specializing in mathematical reasoning.

Your task is to generate PARTIAL SOLUTION STEPS for the given problem. Do NOT solve the problem completely in one response.

CRITICAL INSTRUCTIONS:
1. Generate EXACTLY ONE reasoning step (a \"thought\")
2. The thought should be a concrete intermediate action (e.g., \"Combine 8 and 3 using subtraction: 8 - 3 = 5\")
3. Do NOT provide the final answer unless you are certain it solves the problem
4. Think creatively - try different operations and combinations
5. Format your response as:
   THOUGHT: [Your reasoning step]
   REMAINING: [Numbers/expressions still available]

EXAMPLE (Game of 24 with numbers 4, 9, 10, 13):
THOUGHT: Try multiplication on the largest numbers: 13 - 9 = 4
REMAINING: [4, 4, 10]

Now generate ONE creative reasoning step for the current problem state.";

const EVALUATOR_PROMPT: &str = "You are a critical evaluator of mathematical reasoning paths.

Your task is to score how promising a partial solution is on a scale of 0.0 to 1.0.

SCORING RUBRIC:
- 1.0: This thought directly leads to the correct solution
- 0.7-0.9: Very promising direction, makes good progress toward the goal
- 0.5-0.6: Neutral - doesn't hurt but doesn't clearly help
- 0.3-0.4: Seems like a dead end or complicates the problem
- 0.0-0.2: Definitely wrong (violates rules, introduces errors)

CRITICAL INSTRUCTIONS:
1. Be harsh but fair - most thoughts should score 0.3-0.7
2. Check mathematical correctness (no division by zero, correct operations)
3. Consider if this thought brings us closer to the goal
4. Provide a brief written critique (1-2 sentences)

OUTPUT FORMAT (you MUST follow this exactly):
SCORE: [0.0-1.0]
CRITIQUE: [Your analysis]

EXAMPLE:
SCORE: 0.7
CRITIQUE: Subtracting 9 from 13 gives us a useful building block (4), and we still have flexibility with the remaining numbers. This is a promising path.";

/// System prompts for the generator and evaluator roles.
///
/// Immutable once built; held by whoever renders contexts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptSet {
    /// System prompt for thought proposals.
    #[serde(default = "default_generator")]
    pub generator: String,
    /// System prompt for critiques.
    #[serde(default = "default_evaluator")]
    pub evaluator: String,
}

fn default_generator() -> String {
    GENERATOR_PROMPT.to_string()
}
fn default_evaluator() -> String {
    EVALUATOR_PROMPT.to_string()
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            generator: default_generator(),
            evaluator: default_evaluator(),
        }
    }
}

/// A fully rendered prompt: system instructions plus the per-call user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub system: String,
    pub user: String,
}

impl PromptSet {
    /// Context for requesting one thought for the current state.
    pub fn propose_context(&self, problem: &str, remaining: &[String], history: &[String]) -> PromptContext {
        PromptContext {
            system: self.generator.clone(),
            user: format_propose_message(problem, remaining, history),
        }
    }

    /// Context for scoring one proposed thought against the state it extends.
    pub fn critique_context(
        &self,
        problem: &str,
        remaining: &[String],
        history: &[String],
        thought: &str,
        thought_remaining: &[String],
    ) -> PromptContext {
        PromptContext {
            system: self.evaluator.clone(),
            user: format_critique_message(problem, remaining, history, thought, thought_remaining),
        }
    }
}

fn format_state(problem: &str, remaining: &[String], history: &[String]) -> String {
    let mut msg = format!("PROBLEM: {problem}\n\n");
    msg.push_str(&format!("Current numbers: [{}]\n", remaining.join(", ")));
    if history.is_empty() {
        msg.push_str("Steps so far: none\n");
    } else {
        msg.push_str("Steps so far:\n");
        for (i, step) in history.iter().enumerate() {
            msg.push_str(&format!("{}. {step}\n", i + 1));
        }
    }
    msg
}

/// User message for a proposal request.
pub fn format_propose_message(problem: &str, remaining: &[String], history: &[String]) -> String {
    let mut msg = format_state(problem, remaining, history);
    msg.push_str("\nGenerate ONE reasoning step from the current numbers.");
    msg
}

/// User message for a critique request.
pub fn format_critique_message(
    problem: &str,
    remaining: &[String],
    history: &[String],
    thought: &str,
    thought_remaining: &[String],
) -> String {
    let mut msg = format_state(problem, remaining, history);
    msg.push_str("\nProposed step:\n");
    msg.push_str(&format!("THOUGHT: {thought}\n"));
    msg.push_str(&format!("REMAINING: [{}]\n", thought_remaining.join(", ")));
    msg.push_str("\nScore this step.");
    msg
}

/// Strip leading whitespace and markdown decoration from a line.
fn strip_decoration(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '>' | '-' | '_'))
}

/// Index and remainder of the first line starting with `label` (case-insensitive).
fn find_label<'a>(lines: &[&'a str], label: &str) -> Option<(usize, &'a str)> {
    lines.iter().enumerate().find_map(|(i, line)| {
        let stripped = strip_decoration(line);
        let head = stripped.get(..label.len())?;
        if head.eq_ignore_ascii_case(label) {
            let rest = stripped[label.len()..].trim_start_matches(['*', '_']).trim();
            Some((i, rest))
        } else {
            None
        }
    })
}

/// Split a `REMAINING:` payload into operand tokens.
fn split_operands(payload: &str) -> Vec<String> {
    payload
        .trim()
        .trim_start_matches(['[', '(', '{'])
        .trim_end_matches(['.', ']', ')', '}'])
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a proposal reply. `None` if either line is missing or the thought is empty.
pub fn parse_thought(raw: &str) -> Option<ParsedThought> {
    let lines: Vec<&str> = raw.lines().collect();
    let (_, description) = find_label(&lines, "THOUGHT:")?;
    if description.is_empty() {
        return None;
    }
    let (_, remaining) = find_label(&lines, "REMAINING:")?;
    Some(ParsedThought {
        description: description.to_string(),
        remaining: split_operands(remaining),
    })
}

/// Parse a critique reply.
///
/// Finite scores outside [0, 1] are clamped; missing, non-numeric, or non-finite
/// scores yield `None`. The critique is everything after `CRITIQUE:`.
pub fn parse_score(raw: &str) -> Option<ParsedScore> {
    let lines: Vec<&str> = raw.lines().collect();
    let (_, payload) = find_label(&lines, "SCORE:")?;
    let token = payload
        .trim_start_matches('[')
        .split(|c: char| c.is_whitespace() || c == ']' || c == '/' || c == ',')
        .next()?;
    let value: f64 = token.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let clamped_value = value.clamp(0.0, 1.0);

    let critique = match find_label(&lines, "CRITIQUE:") {
        Some((idx, first)) => {
            let mut parts = vec![first.to_string()];
            parts.extend(lines[idx + 1..].iter().map(|l| l.trim().to_string()));
            parts.join("\n").trim().to_string()
        }
        None => String::new(),
    };

    Some(ParsedScore {
        value: clamped_value,
        critique,
        clamped: clamped_value != value,
    })
}
