use crate::core::analyze::StructuralFeatureSet;
use crate::core::hint::{looks_like_code, Hint};
use crate::core::scan;

use super::VerifierConfig;

/// Aggregate hint quality: 1.0 is clean, 0.0 means the hints leak the
/// implementation or fail every usefulness test.
#[derive(Debug, Clone, Default)]
pub struct HintQualityReport {
    pub score: f64,
    pub issues: Vec<String>,
}

// A single leaking hint zeroes the score; the softer penalties accumulate.
const LITERAL_CODE_PENALTY: f64 = 1.0;
const VAGUENESS_PENALTY: f64 = 0.2;
const RELEVANCE_PENALTY: f64 = 0.1;

pub(super) fn assess(
    hints: &[Hint],
    original_logic: &[String],
    features: &StructuralFeatureSet,
    config: &VerifierConfig,
) -> HintQualityReport {
    let feature_names = features.detected_names();
    let mut total = 0.0;
    let mut issues = Vec::new();

    for (index, hint) in hints.iter().enumerate() {
        let label = format!("hint {} ({})", index + 1, hint.category);

        let leaks = looks_like_code(&hint.content)
            || original_logic
                .iter()
                .any(|line| scan::contains_literal(&hint.content, line, config.min_literal_len));
        if leaks {
            total += LITERAL_CODE_PENALTY;
            issues.push(format!("{label}: contains literal implementation code"));
        }

        if hint.content.split_whitespace().count() < config.min_hint_tokens {
            total += VAGUENESS_PENALTY;
            issues.push(format!("{label}: too short to be actionable"));
        }

        if !feature_names.is_empty() {
            let content = hint.content.to_lowercase();
            if !feature_names.iter().any(|name| content.contains(name)) {
                total += RELEVANCE_PENALTY;
                issues.push(format!(
                    "{label}: mentions none of the detected structural features"
                ));
            }
        }
    }

    HintQualityReport {
        score: 1.0 - total.min(1.0),
        issues,
    }
}
