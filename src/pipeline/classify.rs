// Risk classification of free-text engine responses.
// Best-effort by construction: every input yields an AnalysisResult, gaps are
// recorded as degradations and logged, never raised.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::TriageConfig;
use crate::models::{AnalysisResult, ClassificationDegradation, TriageStatus};

/// Keywords whose presence anywhere in a response marks it urgent.
pub const DEFAULT_EMERGENCY_KEYWORDS: &[&str] = &[
    "emergency",
    "severe",
    "anaphylaxis",
    "difficulty breathing",
    "chest pain",
    "poisoning",
    "urgent",
    "doctor immediately",
];

/// Confidence below this (exclusive) downgrades a response to `Caution`.
pub const DEFAULT_CAUTION_THRESHOLD: u8 = 50;

/// How far into the response an uppercase `EMERGENCY` still counts as the
/// model's escalation marker (characters, after leading whitespace).
pub const ESCALATION_MARKER_WINDOW: usize = 120;

const ESCALATION_MARKER: &str = "EMERGENCY";

/// Words that cancel a keyword when they sit directly in front of it
/// ("no urgent findings", "denies chest pain", "non-urgent"). A negation
/// further back ("do not ignore severe pain") leaves the keyword flagged.
const NEGATIONS: &[&str] = &["no", "not", "non", "without", "denies", "never"];

/// Keyword is case-sensitive; tolerates markdown bold around the value.
static CONFIDENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CONFIDENCE SCORE:[\s*]*(\d+)\s*%").expect("Invalid confidence regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseClassifier {
    /// (as configured, lowercased for matching)
    keywords: Vec<(String, String)>,
    caution_threshold: u8,
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_EMERGENCY_KEYWORDS.iter().copied(), DEFAULT_CAUTION_THRESHOLD)
    }
}

impl ResponseClassifier {
    /// Blank keywords are dropped; duplicates (ignoring case) collapse.
    pub fn new<I, S>(keywords: I, caution_threshold: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let keywords = keywords
            .into_iter()
            .filter_map(|k| {
                let label = k.as_ref().trim().to_string();
                let needle = label.to_lowercase();
                (!needle.is_empty() && seen.insert(needle.clone())).then_some((label, needle))
            })
            .collect();
        Self {
            keywords,
            caution_threshold,
        }
    }

    pub fn from_config(config: &TriageConfig) -> Self {
        Self::new(&config.emergency_keywords, config.confidence_caution_threshold)
    }

    pub fn caution_threshold(&self) -> u8 {
        self.caution_threshold
    }

    /// Classify one engine response. Never fails.
    pub fn classify(&self, response_text: &str) -> AnalysisResult {
        let mut degradations = Vec::new();
        let is_empty = response_text.trim().is_empty();

        let emergency_flags = self.scan_emergency_keywords(response_text);
        let confidence_score = if is_empty {
            degradations.push(ClassificationDegradation::EmptyResponse);
            None
        } else {
            extract_confidence(response_text, &mut degradations)
        };

        // The uppercase marker is matched as-is, negated or not.
        let status = if !emergency_flags.is_empty() || has_escalation_marker(response_text) {
            TriageStatus::Urgent
        } else if confidence_score.is_some_and(|c| c < self.caution_threshold) {
            TriageStatus::Caution
        } else if is_empty {
            TriageStatus::Unknown
        } else {
            TriageStatus::Stable
        };

        if !degradations.is_empty() {
            tracing::debug!(
                degradations = ?degradations,
                response_len = response_text.len(),
                "Response only partially interpreted"
            );
        }
        tracing::debug!(
            status = %status,
            flag_count = emergency_flags.len(),
            confidence = ?confidence_score,
            "Response classified"
        );

        AnalysisResult {
            raw_text: response_text.to_string(),
            emergency_flags,
            confidence_score,
            status,
            degradations,
        }
    }

    /// Case-insensitive substring scan against the keyword set. A keyword
    /// counts when at least one occurrence is not negated.
    pub fn scan_emergency_keywords(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|(_, needle)| {
                haystack
                    .match_indices(needle.as_str())
                    .any(|(idx, _)| !is_negated(&haystack[..idx]))
            })
            .map(|(label, _)| label.clone())
            .collect()
    }
}

/// True if the word right before a match, separated by whitespace or a
/// single hyphen, is a negation.
fn is_negated(preceding: &str) -> bool {
    let head = match preceding.strip_suffix('-') {
        Some(head) => head,
        None => {
            let trimmed = preceding.trim_end();
            if trimmed.len() == preceding.len() {
                return false;
            }
            trimmed
        }
    };
    let word = head
        .rsplit(|c: char| !c.is_alphanumeric())
        .next()
        .unwrap_or_default();
    NEGATIONS.contains(&word)
}

/// First `CONFIDENCE SCORE: N%` wins; values above 100 are discarded.
fn extract_confidence(
    text: &str,
    degradations: &mut Vec<ClassificationDegradation>,
) -> Option<u8> {
    let Some(caps) = CONFIDENCE_PATTERN.captures(text) else {
        degradations.push(ClassificationDegradation::ConfidenceMissing);
        return None;
    };
    let digits = &caps[1];
    match digits.parse::<u32>() {
        Ok(value) if value <= 100 => u8::try_from(value).ok(),
        _ => {
            degradations.push(ClassificationDegradation::ConfidenceOutOfRange {
                value: digits.to_string(),
            });
            None
        }
    }
}

/// Uppercase `EMERGENCY` within the opening of the response.
fn has_escalation_marker(text: &str) -> bool {
    let opening = text.trim_start();
    let window = match opening.char_indices().nth(ESCALATION_MARKER_WINDOW) {
        Some((idx, _)) => &opening[..idx],
        None => opening,
    };
    window.contains(ESCALATION_MARKER)
}

/// Convenience for one-off classification with the default configuration.
pub fn classify_response(response_text: &str) -> AnalysisResult {
    ResponseClassifier::default().classify(response_text)
}
