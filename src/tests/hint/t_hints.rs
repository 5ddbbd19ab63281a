use super::*;

use crate::core::analyze::StructuralFeatureSet;
use crate::core::policy::Tier;

fn looped_features() -> StructuralFeatureSet {
    StructuralFeatureSet {
        has_loop: true,
        has_conditional: true,
        ..Default::default()
    }
}

fn generate(features: &StructuralFeatureSet, tier: Tier) -> Vec<Hint> {
    let registry = TemplateRegistry::builtin();
    let generator = HintGenerator::new(&registry);
    generator.generate(features, &tier.policy())
}

#[test]
fn test_generate_within_policy_band_all_tiers() {
    let features = looped_features();
    for tier in Tier::ALL {
        let policy = tier.policy();
        let hints = generate(&features, tier);
        assert!(
            hints.len() >= policy.min_hints && hints.len() <= policy.max_hints,
            "{tier}: {} hints outside [{}, {}]",
            hints.len(),
            policy.min_hints,
            policy.max_hints
        );
    }
}

#[test]
fn test_generate_leading_conceptual_and_approach() {
    let hints = generate(&looped_features(), Tier::Minimal);

    assert_eq!(hints[0].category, HintCategory::Conceptual);
    assert!(hints
        .iter()
        .any(|h| h.category == HintCategory::Approach));
}

#[test]
fn test_generate_monotonic_hint_counts() {
    let features = looped_features();
    let detailed = generate(&features, Tier::Detailed).len();
    let moderate = generate(&features, Tier::Moderate).len();
    let minimal = generate(&features, Tier::Minimal).len();

    assert!(detailed >= moderate);
    assert!(moderate >= minimal);
}

#[test]
fn test_generate_error_handling_adds_conceptual_hint() {
    let plain = generate(&looped_features(), Tier::Detailed);

    let mut with_errors = looped_features();
    with_errors.has_error_handling = true;
    let guarded = generate(&with_errors, Tier::Detailed);

    let conceptual = |hints: &[Hint]| {
        hints
            .iter()
            .filter(|h| h.category == HintCategory::Conceptual)
            .count()
    };
    assert_eq!(conceptual(&guarded), conceptual(&plain) + 1);
}

#[test]
fn test_generate_resource_only_when_detailed() {
    let features = looped_features();
    let has_resource = |hints: &[Hint]| {
        hints
            .iter()
            .any(|h| h.category == HintCategory::Resource)
    };

    assert!(has_resource(&generate(&features, Tier::Detailed)));
    assert!(!has_resource(&generate(&features, Tier::Moderate)));
    assert!(!has_resource(&generate(&features, Tier::Minimal)));
}

#[test]
fn test_generate_deterministic() {
    let features = looped_features();
    assert_eq!(
        generate(&features, Tier::Moderate),
        generate(&features, Tier::Moderate)
    );
}

#[test]
fn test_generate_mentions_detected_features() {
    let mut features = looped_features();
    features.has_error_handling = true;
    let hints = generate(&features, Tier::Detailed);

    for hint in &hints {
        let content = hint.content.to_lowercase();
        assert!(
            content.contains("loop")
                || content.contains("condition")
                || content.contains("error"),
            "hint mentions no detected feature: {}",
            hint.content
        );
    }
}

#[test]
fn test_looks_like_code_detects_assignment_call() {
    assert!(looks_like_code("result = compute(items)"));
    assert!(looks_like_code("total=sum(values)"));
    assert!(looks_like_code("return total / count"));
    assert!(!looks_like_code(
        "Keep a running total while you walk the loop."
    ));
    assert!(!looks_like_code(
        "Compare each pair (left, right) before moving on."
    ));
}

#[test]
fn test_fit_to_policy_truncates_resource_first() {
    let policy = Tier::Minimal.policy();
    let hints = vec![
        Hint::new(HintCategory::Conceptual, "what the code is for overall"),
        Hint::new(HintCategory::Approach, "break the work into small stages"),
        Hint::new(HintCategory::Implementation, "keep a running loop total"),
        Hint::new(HintCategory::Resource, "reading material on the topic"),
        Hint::new(HintCategory::Implementation, "name things clearly"),
    ];
    let fitted = fit_to_policy(hints, &policy);

    assert_eq!(fitted.len(), policy.max_hints);
    assert!(!fitted
        .iter()
        .any(|h| h.category == HintCategory::Resource));
    assert_eq!(fitted[0].category, HintCategory::Conceptual);
    assert_eq!(fitted[1].category, HintCategory::Approach);
}

#[test]
fn test_fit_to_policy_pads_to_minimum() {
    let policy = Tier::Detailed.policy();
    let hints = vec![
        Hint::new(HintCategory::Conceptual, "what the code is for overall"),
        Hint::new(HintCategory::Approach, "break the work into small stages"),
        Hint::new(HintCategory::Implementation, "keep a running loop total"),
    ];
    let fitted = fit_to_policy(hints, &policy);

    assert!(fitted.len() >= policy.min_hints);
}

#[test]
fn test_registry_render_substitutes_variables() {
    let mut registry = TemplateRegistry::new();
    registry.insert("greet", "hello {name}, welcome");

    assert_eq!(registry.render("greet", &[("name", "ada")]), "hello ada, welcome");
}

#[test]
fn test_registry_builtin_templates_are_guidance_not_code() {
    let registry = TemplateRegistry::builtin();
    for (key, template) in registry.entries() {
        assert!(
            !looks_like_code(template),
            "builtin template {key} reads like code"
        );
    }
}
