use crate::core::analyze::StructuralFeatureSet;
use crate::core::hint::{fit_to_policy, Hint, HintCategory, HintGenerator};
use crate::core::policy::TierPolicy;
use crate::core::tree::FunctionDef;

use super::function::scaffold_function_with_hints;
use super::ScaffoldedCode;

/// Extends the function pattern with complexity-aware guidance. The extra
/// hints name the consideration, never the concrete complexity class.
pub(super) fn scaffold_algorithm(
    source: &str,
    def: &FunctionDef,
    features: &StructuralFeatureSet,
    policy: &TierPolicy,
    hints: &HintGenerator<'_>,
) -> ScaffoldedCode {
    let mut hint_list = hints.generate(features, policy);

    if features.has_recursion || features.has_nested_loop {
        let complexity = Hint::new(
            HintCategory::Conceptual,
            hints.registry().render("conceptual.complexity", &[]),
        );
        // After the leading conceptual hint, before the approach hint.
        let pos = hint_list
            .iter()
            .rposition(|h| h.category == HintCategory::Conceptual)
            .map(|p| p + 1)
            .unwrap_or(0);
        hint_list.insert(pos, complexity);

        if policy.includes_examples {
            let pseudocode = Hint::new(
                HintCategory::Approach,
                hints.registry().render("approach.pseudocode", &[]),
            );
            let pos = hint_list
                .iter()
                .rposition(|h| h.category == HintCategory::Approach)
                .map(|p| p + 1)
                .unwrap_or(hint_list.len());
            hint_list.insert(pos, pseudocode);
        }
        hint_list = fit_to_policy(hint_list, policy);
    }

    scaffold_function_with_hints(source, def, features, policy, hint_list)
}
