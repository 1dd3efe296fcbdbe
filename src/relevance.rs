//! Best-effort parsing of a relevance verdict out of free-form model output.
//!
//! The chain is: first JSON object in the text, then a keyword scan of the raw
//! text, then `unknown`. Parsing never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Yes,
    Somewhat,
    No,
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yes => "yes",
            Verdict::Somewhat => "somewhat",
            Verdict::No => "no",
            Verdict::Unknown => "unknown",
        }
    }

    fn from_json(value: &Value) -> Verdict {
        match value {
            Value::Bool(true) => Verdict::Yes,
            Value::Bool(false) => Verdict::No,
            Value::String(s) => {
                let normalized = s
                    .trim()
                    .trim_end_matches(|c: char| c.is_ascii_punctuation())
                    .to_ascii_lowercase();
                match normalized.as_str() {
                    "yes" => Verdict::Yes,
                    "somewhat" => Verdict::Somewhat,
                    "no" => Verdict::No,
                    _ => keyword_verdict(&normalized).verdict,
                }
            }
            _ => Verdict::Unknown,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relevance {
    pub verdict: Verdict,
    pub reasoning: String,
}

impl Relevance {
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Unknown,
            reasoning: reasoning.into(),
        }
    }
}

fn json_object_regex() -> &'static Regex {
    // Greedy: first '{' to last '}'.
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("json object pattern is valid"))
}

pub fn parse_relevance(text: &str) -> Relevance {
    let content = text.trim();

    if let Some(structured) = parse_structured(content) {
        tracing::debug!(verdict = %structured.verdict, "Parsed structured relevance verdict");
        return structured;
    }

    keyword_verdict(content)
}

fn parse_structured(content: &str) -> Option<Relevance> {
    let candidate = json_object_regex().find(content)?;

    let value: Value = match serde_json::from_str(candidate.as_str()) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to parse JSON from relevance analysis");
            return None;
        }
    };

    let object = value.as_object()?;
    let verdict = object.get("is_relevant")?;
    let reasoning = object.get("reasoning")?;

    Some(Relevance {
        verdict: Verdict::from_json(verdict),
        reasoning: match reasoning {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}

/// Substring scan in the order yes, somewhat, no. "no" also matches inside words
/// such as "know" or "unknown"; see DESIGN.md before changing it.
pub fn keyword_verdict(content: &str) -> Relevance {
    let lowered = content.to_lowercase();
    let verdict = if lowered.contains("yes") {
        Verdict::Yes
    } else if lowered.contains("somewhat") {
        Verdict::Somewhat
    } else if lowered.contains("no") {
        Verdict::No
    } else {
        Verdict::Unknown
    };

    Relevance {
        verdict,
        reasoning: content.to_string(),
    }
}
