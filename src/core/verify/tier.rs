use crate::core::convert::ScaffoldedCode;
use crate::core::policy::Tier;

/// Declared versus observed tier, inferred purely from artifact counts. A
/// mismatch is reported, never auto-corrected.
#[derive(Debug, Clone)]
pub struct TierConsistencyReport {
    pub declared_tier: Tier,
    pub observed_tier: Option<Tier>,
    pub issues: Vec<String>,
}

impl TierConsistencyReport {
    pub(super) fn inconclusive(declared_tier: Tier) -> Self {
        Self {
            declared_tier,
            observed_tier: None,
            issues: Vec::new(),
        }
    }
}

pub(super) fn check(code: &ScaffoldedCode, declared_tier: Tier) -> TierConsistencyReport {
    // A body preserved as-is carries no scaffolding artifacts to infer from;
    // it is consistent with whatever was declared.
    if code.todo_markers.is_empty() {
        return TierConsistencyReport {
            declared_tier,
            observed_tier: Some(declared_tier),
            issues: Vec::new(),
        };
    }

    let hint_count = code.hints.len();
    let has_examples = code.body.contains("# Example");

    // Narrowest band first, so an overlapping hint count resolves to the
    // least-guidance tier it fits.
    let observed_tier = Tier::ALL.into_iter().rev().find(|tier| {
        let policy = tier.policy();
        (policy.min_hints..=policy.max_hints).contains(&hint_count)
            && policy.includes_examples == has_examples
    });

    let mut issues = Vec::new();
    match observed_tier {
        None => issues.push(format!(
            "{} hints {} worked examples match no tier's policy band",
            hint_count,
            if has_examples { "with" } else { "without" }
        )),
        Some(observed) if observed != declared_tier => issues.push(format!(
            "declared {declared_tier} but the artifact counts look like {observed}"
        )),
        Some(_) => {}
    }

    TierConsistencyReport {
        declared_tier,
        observed_tier,
        issues,
    }
}
