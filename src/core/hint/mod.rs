mod registry;

pub use registry::TemplateRegistry;

use std::fmt::{Display, Formatter};

use crate::core::analyze::StructuralFeatureSet;
use crate::core::policy::TierPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintCategory {
    Conceptual,
    Approach,
    Implementation,
    Resource,
}

impl Display for HintCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HintCategory::Conceptual => "conceptual",
            HintCategory::Approach => "approach",
            HintCategory::Implementation => "implementation",
            HintCategory::Resource => "resource",
        };
        write!(f, "{name}")
    }
}

/// One piece of categorized guidance. Content must never reproduce the
/// removed implementation; that is enforced here at generation time and
/// re-checked independently by the verifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub category: HintCategory,
    pub content: String,
}

impl Hint {
    pub fn new(category: HintCategory, content: impl Into<String>) -> Self {
        Self {
            category,
            content: content.into(),
        }
    }
}

/// True when hint text reads like runnable code rather than guidance: an
/// assignment-plus-call line, or a literal return statement.
pub fn looks_like_code(content: &str) -> bool {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("return ") {
            return true;
        }
        let has_assign =
            trimmed.contains(" = ") || (trimmed.contains('=') && trimmed.contains('('));
        if has_assign && trimmed.contains('(') && trimmed.contains(')') {
            return true;
        }
    }
    false
}

/// Deterministic feature-to-hint mapping under a tier policy.
pub struct HintGenerator<'a> {
    registry: &'a TemplateRegistry,
}

impl<'a> HintGenerator<'a> {
    pub fn new(registry: &'a TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        self.registry
    }

    /// Produces the ordered hint list for one unit. Always exactly one
    /// leading conceptual hint and one approach hint; implementation and
    /// resource counts scale with the tier. Output length is within
    /// `[policy.min_hints, policy.max_hints]`.
    pub fn generate(&self, features: &StructuralFeatureSet, policy: &TierPolicy) -> Vec<Hint> {
        let summary = feature_summary(features);
        let mut hints = Vec::new();

        let purpose = if summary.is_empty() {
            self.registry.render("conceptual.purpose.plain", &[])
        } else {
            self.registry
                .render("conceptual.purpose", &[("features", summary.as_str())])
        };
        hints.push(Hint::new(HintCategory::Conceptual, purpose));

        if features.has_error_handling {
            hints.push(Hint::new(
                HintCategory::Conceptual,
                self.registry.render("conceptual.failure", &[]),
            ));
        }

        let approach = if summary.is_empty() {
            self.registry.render("approach.decompose.plain", &[])
        } else {
            self.registry
                .render("approach.decompose", &[("features", summary.as_str())])
        };
        hints.push(Hint::new(HintCategory::Approach, approach));

        let detailed = policy.includes_examples;
        let implementation_budget = match policy.max_hints {
            0..=3 => 1,
            4..=5 => 2,
            _ => 3,
        };
        let mut pool = Vec::new();
        if detailed && features.has_error_handling {
            pool.push("implementation.guard");
        }
        if features.has_recursion {
            pool.push("implementation.base-case");
        }
        if features.is_sort_like {
            pool.push("implementation.swap");
        }
        if features.has_loop {
            pool.push("implementation.loop");
        }
        if features.has_conditional {
            pool.push("implementation.condition");
        }
        pool.push("implementation.accumulator");
        pool.push("implementation.small-steps");

        for key in pool.into_iter().take(implementation_budget) {
            let content = self.registry.render(key, &[]);
            if looks_like_code(&content) {
                // A drifted template must degrade to safe generic guidance,
                // never leak through.
                hints.push(Hint::new(
                    HintCategory::Implementation,
                    self.registry.render("implementation.small-steps", &[]),
                ));
            } else {
                hints.push(Hint::new(HintCategory::Implementation, content));
            }
        }

        if detailed {
            let resource = if summary.is_empty() {
                self.registry.render("resource.reading.plain", &[])
            } else {
                self.registry
                    .render("resource.reading", &[("features", summary.as_str())])
            };
            hints.push(Hint::new(HintCategory::Resource, resource));
        }

        fit_to_policy(hints, policy)
    }
}

/// Clamps a hint list into the policy band. Over budget, resource hints are
/// dropped first, then trailing implementation hints, then trailing hints of
/// any category (the leading conceptual/approach pair is never dropped).
/// Under budget, generic implementation guidance pads the list.
pub fn fit_to_policy(mut hints: Vec<Hint>, policy: &TierPolicy) -> Vec<Hint> {
    while hints.len() > policy.max_hints {
        if let Some(pos) = hints
            .iter()
            .rposition(|h| h.category == HintCategory::Resource)
        {
            hints.remove(pos);
            continue;
        }
        if let Some(pos) = hints
            .iter()
            .rposition(|h| h.category == HintCategory::Implementation)
        {
            hints.remove(pos);
            continue;
        }
        if hints.len() > 2 {
            hints.pop();
        } else {
            break;
        }
    }

    let padding = [
        "Implement the marked steps one at a time and verify each before moving to the next one.",
        "Name intermediate values descriptively so each statement documents the step it performs.",
    ];
    let mut pad = padding.iter();
    while hints.len() < policy.min_hints {
        match pad.next() {
            Some(content) => hints.push(Hint::new(HintCategory::Implementation, *content)),
            None => break,
        }
    }
    hints
}

/// Short prose listing of the detected structural features.
fn feature_summary(features: &StructuralFeatureSet) -> String {
    let mut parts = Vec::new();
    if features.has_nested_loop {
        parts.push("nested loops");
    } else if features.has_loop {
        parts.push("a loop");
    }
    if features.has_conditional {
        parts.push("a condition to branch on");
    }
    if features.has_error_handling {
        parts.push("error handling");
    }
    if features.has_recursion {
        parts.push("recursion");
    }
    if features.is_sort_like {
        parts.push("sort-style element ordering");
    }
    parts.join(", ")
}

#[cfg(test)]
#[path = "../../tests/hint/t_hints.rs"]
mod tests;
