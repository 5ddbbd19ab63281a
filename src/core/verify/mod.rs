//! Quality verifier: four independent, pure checks over one scaffolded
//! exercise, run in a fixed order. The solution detector runs first since a
//! leaked solution undercuts the meaningfulness of the later checks; each
//! check still always runs and reports.

mod annotations;
mod hint_quality;
mod solution;
mod tier;

pub use annotations::TypeHintReport;
pub use hint_quality::HintQualityReport;
pub use solution::{Severity, SolutionViolation};
pub use tier::TierConsistencyReport;

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::core::analyze::StructuralFeatureSet;
use crate::core::convert::ScaffoldedCode;
use crate::core::policy::Tier;
use crate::core::scan;
use crate::core::unit::UnitKind;

/// Heuristic knobs of the verifier. Fuzzy policy constants, not verified
/// optima; calibrate against a real corpus before trusting the defaults.
#[derive(Debug, Clone, Copy)]
pub struct VerifierConfig {
    /// Logic-line count above which remaining body logic is a leak.
    pub max_preserved_logic_lines: usize,
    /// Hints shorter than this many whitespace-separated tokens are vague.
    pub min_hint_tokens: usize,
    /// Normalized length below which a line is too generic to count as a
    /// literal match.
    pub min_literal_len: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_preserved_logic_lines: 5,
            min_hint_tokens: 8,
            min_literal_len: 12,
        }
    }
}

/// The bundled output of the four checks, plus any findings downgraded to
/// inconclusive after a check panicked.
#[derive(Debug, Clone)]
pub struct Verification {
    pub violations: Vec<SolutionViolation>,
    pub type_hint_report: TypeHintReport,
    pub hint_quality_report: HintQualityReport,
    pub tier_consistency_report: TierConsistencyReport,
    pub inconclusive: Vec<String>,
}

/// Runs the four checks in their fixed order. A panic inside one check is
/// caught and downgraded to an inconclusive finding naming the unit, so a
/// report is produced for every unit no matter what.
pub fn verify(
    code: &ScaffoldedCode,
    features: &StructuralFeatureSet,
    original_source: &str,
    kind: UnitKind,
    declared_tier: Tier,
    config: &VerifierConfig,
    context_id: &str,
) -> Verification {
    let mut inconclusive = Vec::new();

    let violations = guarded(
        "solution-detector",
        context_id,
        &mut inconclusive,
        Vec::new,
        || solution::detect(code, config),
    );

    let type_hint_report = guarded(
        "type-annotation-validator",
        context_id,
        &mut inconclusive,
        TypeHintReport::default,
        || annotations::validate(features, kind),
    );

    let original_logic: Vec<String> = {
        let regions = scan::region_tags(original_source);
        scan::logic_lines(original_source, &regions)
            .into_iter()
            .map(|line| line.text.to_string())
            .collect()
    };
    let hint_quality_report = guarded(
        "hint-quality-assessor",
        context_id,
        &mut inconclusive,
        HintQualityReport::default,
        || hint_quality::assess(&code.hints, &original_logic, features, config),
    );

    let tier_consistency_report = guarded(
        "tier-consistency-checker",
        context_id,
        &mut inconclusive,
        || TierConsistencyReport::inconclusive(declared_tier),
        || tier::check(code, declared_tier),
    );

    Verification {
        violations,
        type_hint_report,
        hint_quality_report,
        tier_consistency_report,
        inconclusive,
    }
}

fn guarded<T>(
    check: &str,
    context_id: &str,
    inconclusive: &mut Vec<String>,
    fallback: impl FnOnce() -> T,
    run: impl FnOnce() -> T,
) -> T {
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(check, context_id, "verifier check panicked, downgraded");
            inconclusive.push(format!("{check}: inconclusive (internal fault on unit {context_id})"));
            fallback()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/verify/t_verify.rs"]
mod tests;
