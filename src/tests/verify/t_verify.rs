use super::*;

use indoc::indoc;

use crate::core::analyze::{AnalyzedUnit, PythonAnalyzer, StructuralAnalyzer};
use crate::core::convert::{convert, ScaffoldedCode};
use crate::core::hint::{Hint, HintCategory, HintGenerator, TemplateRegistry};
use crate::core::policy::Tier;
use crate::core::unit::UnitKind;

const AVERAGE: &str = indoc! {r#"
    def average(values: list[float]) -> float:
        """Return the arithmetic mean of values."""
        if not values:
            raise ValueError("empty input")
        total = 0.0
        for value in values:
            total += value
        count = len(values)
        return total / count
"#};

fn analyze(source: &str, kind: UnitKind) -> AnalyzedUnit {
    PythonAnalyzer
        .analyze(source, kind)
        .expect("Failed to analyze")
}

fn scaffold(source: &str, kind: UnitKind, tier: Tier) -> (ScaffoldedCode, AnalyzedUnit) {
    let analyzed = analyze(source, kind);
    let registry = TemplateRegistry::builtin();
    let hints = HintGenerator::new(&registry);
    let code = convert(source, &analyzed, kind, &tier.policy(), &hints);
    (code, analyzed)
}

fn run(
    code: &ScaffoldedCode,
    analyzed: &AnalyzedUnit,
    source: &str,
    kind: UnitKind,
    tier: Tier,
) -> Verification {
    verify(
        code,
        &analyzed.features,
        source,
        kind,
        tier,
        &VerifierConfig::default(),
        "unit-under-test",
    )
}

#[test]
fn test_clean_scaffold_has_no_violations() {
    let (code, analyzed) = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Detailed);

    assert!(report.violations.is_empty());
    assert!(report.inconclusive.is_empty());
}

#[test]
fn test_unscaffolded_body_raises_high_violation() {
    // Hand-built scaffold whose body still carries the full implementation.
    let analyzed = analyze(AVERAGE, UnitKind::Function);
    let code = ScaffoldedCode {
        signature: "def average(values: list[float]) -> float:".to_string(),
        docstring: None,
        todo_markers: vec!["# TODO(transform): compute the result".to_string()],
        hints: Vec::new(),
        preserved_regions: Vec::new(),
        body: AVERAGE.to_string(),
    };
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Moderate);

    let high: Vec<_> = report
        .violations
        .iter()
        .filter(|v| v.severity == Severity::High)
        .collect();
    assert_eq!(high.len(), 1);
    assert!(high[0].snippet.contains("if not values:"));
}

#[test]
fn test_pasted_back_solution_pinpoints_line_range() {
    let (mut code, analyzed) = scaffold(AVERAGE, UnitKind::Function, Tier::Moderate);

    // A learner pastes the original six logic lines back over the TODOs.
    code.body = AVERAGE.to_string();
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Moderate);

    assert_eq!(report.violations.len(), 1);
    let violation = &report.violations[0];
    assert_eq!(violation.severity, Severity::High);
    assert_eq!(violation.span.start.line, 3);
    assert_eq!(violation.span.end.line, 9);
}

#[test]
fn test_loop_conditional_return_triple_is_high_even_under_threshold() {
    let body = indoc! {"
        def pick(items):
            for item in items:
                if item:
                    return item + 1
    "};
    let analyzed = analyze(body, UnitKind::Function);
    let code = ScaffoldedCode {
        signature: "def pick(items):".to_string(),
        docstring: None,
        todo_markers: vec!["# TODO(transform): compute the result".to_string()],
        hints: Vec::new(),
        preserved_regions: Vec::new(),
        body: body.to_string(),
    };
    let report = run(&code, &analyzed, body, UnitKind::Function, Tier::Moderate);

    assert!(report
        .violations
        .iter()
        .any(|v| v.severity == Severity::High));
}

#[test]
fn test_constant_return_not_a_leak() {
    let body = indoc! {"
        def ready():
            return True
    "};
    let analyzed = analyze(body, UnitKind::Function);
    let code = ScaffoldedCode {
        signature: "def ready():".to_string(),
        docstring: None,
        todo_markers: Vec::new(),
        hints: Vec::new(),
        preserved_regions: Vec::new(),
        body: body.to_string(),
    };
    let report = run(&code, &analyzed, body, UnitKind::Function, Tier::Minimal);

    assert!(report.violations.is_empty());
}

#[test]
fn test_flawed_example_region_is_low_severity() {
    let source = indoc! {"
        def lookup(table, key):
            # flawed-example:start
            for k in table:
                if k == key:
                    return table[k]
            # flawed-example:end
            found = probe(table, key)
            checked = verify_entry(found)
            logged = audit(checked)
            cached = store(logged)
            ranked = score(cached)
            return unwrap(ranked)
    "};
    let (code, analyzed) = scaffold(source, UnitKind::Function, Tier::Moderate);
    let report = run(&code, &analyzed, source, UnitKind::Function, Tier::Moderate);

    assert!(report
        .violations
        .iter()
        .all(|v| v.severity == Severity::Low));
    assert!(!report.violations.is_empty());
}

#[test]
fn test_type_hint_full_coverage() {
    let (code, analyzed) = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Detailed);

    assert_eq!(report.type_hint_report.coverage, 1.0);
    assert!(report.type_hint_report.missing.is_empty());
}

#[test]
fn test_type_hint_missing_param_and_return() {
    let source = indoc! {"
        def mix(a: int, b):
            part = scale(a)
            rest = shift(b)
            left = fold(part)
            right = fold(rest)
            joined = weave(left, right)
            return joined
    "};
    let (code, analyzed) = scaffold(source, UnitKind::Function, Tier::Moderate);
    let report = run(&code, &analyzed, source, UnitKind::Function, Tier::Moderate);

    assert_eq!(
        report.type_hint_report.missing,
        vec!["b".to_string(), "return".to_string()]
    );
    assert!((report.type_hint_report.coverage - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_type_hint_receiver_excluded() {
    let source = indoc! {"
        class C:
            def m(self, x: int) -> int:
                return x
    "};
    let (code, analyzed) = scaffold(source, UnitKind::Class, Tier::Minimal);
    let report = run(&code, &analyzed, source, UnitKind::Class, Tier::Minimal);

    assert_eq!(report.type_hint_report.coverage, 1.0);
}

#[test]
fn test_type_hint_test_unit_skips_return() {
    let source = indoc! {"
        def test_mix():
            out = mix(1, 2)
            assert out
    "};
    let (code, analyzed) = scaffold(source, UnitKind::Test, Tier::Minimal);
    let report = run(&code, &analyzed, source, UnitKind::Test, Tier::Minimal);

    assert!(!report
        .type_hint_report
        .missing
        .iter()
        .any(|name| name == "return"));
}

#[test]
fn test_hint_quality_full_score_for_generated_hints() {
    let (code, analyzed) = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Detailed);

    assert!(report.hint_quality_report.score > 0.9,
        "score {} with issues {:?}",
        report.hint_quality_report.score,
        report.hint_quality_report.issues);
}

#[test]
fn test_hint_quality_zero_when_hint_leaks_return_expression() {
    let (mut code, analyzed) = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    code.hints.push(Hint::new(
        HintCategory::Implementation,
        "At the end just write return total / count and you are done",
    ));
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Detailed);

    assert_eq!(report.hint_quality_report.score, 0.0);
}

#[test]
fn test_hint_quality_vagueness_penalty() {
    let analyzed = analyze(AVERAGE, UnitKind::Function);
    let code = ScaffoldedCode {
        signature: "def average(values: list[float]) -> float:".to_string(),
        docstring: None,
        todo_markers: vec!["# TODO(transform): compute the result".to_string()],
        hints: vec![Hint::new(HintCategory::Conceptual, "think about loops")],
        preserved_regions: Vec::new(),
        body: "def average(values: list[float]) -> float:\n    pass".to_string(),
    };
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Minimal);

    assert!(report
        .hint_quality_report
        .issues
        .iter()
        .any(|issue| issue.contains("too short")));
    assert!(report.hint_quality_report.score < 1.0);
}

#[test]
fn test_hint_quality_relevance_penalty() {
    let analyzed = analyze(AVERAGE, UnitKind::Function);
    let code = ScaffoldedCode {
        signature: "def average(values: list[float]) -> float:".to_string(),
        docstring: None,
        todo_markers: vec!["# TODO(transform): compute the result".to_string()],
        hints: vec![Hint::new(
            HintCategory::Conceptual,
            "Consider the broader architectural implications of this program before starting",
        )],
        preserved_regions: Vec::new(),
        body: "def average(values: list[float]) -> float:\n    pass".to_string(),
    };
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Minimal);

    assert!(report
        .hint_quality_report
        .issues
        .iter()
        .any(|issue| issue.contains("structural features")));
}

#[test]
fn test_tier_round_trip_consistency() {
    for tier in Tier::ALL {
        let (code, analyzed) = scaffold(AVERAGE, UnitKind::Function, tier);
        let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, tier);

        assert!(
            report.tier_consistency_report.issues.is_empty(),
            "{tier}: {:?}",
            report.tier_consistency_report.issues
        );
        assert_eq!(report.tier_consistency_report.observed_tier, Some(tier));
    }
}

#[test]
fn test_tier_round_trip_for_detailed_test_unit() {
    let source = indoc! {r#"
        def test_insert_keeps_order():
            """Inserting into a sorted list keeps it sorted."""
            items = [1, 3, 5]
            target = 4
            expected = [1, 3, 4, 5]
            result = insert_sorted(items, target)
            assert result == expected
            assert len(result) == 4
    "#};
    let (code, analyzed) = scaffold(source, UnitKind::Test, Tier::Detailed);
    let report = run(&code, &analyzed, source, UnitKind::Test, Tier::Detailed);

    assert!(!code.todo_markers.is_empty());
    assert!(code.body.contains("# Example:"));
    assert!(
        report.tier_consistency_report.issues.is_empty(),
        "{:?}",
        report.tier_consistency_report.issues
    );
    assert_eq!(
        report.tier_consistency_report.observed_tier,
        Some(Tier::Detailed)
    );
}

#[test]
fn test_tier_mismatch_reported() {
    let (code, analyzed) = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    let report = run(&code, &analyzed, AVERAGE, UnitKind::Function, Tier::Minimal);

    assert!(!report.tier_consistency_report.issues.is_empty());
    assert_eq!(
        report.tier_consistency_report.observed_tier,
        Some(Tier::Detailed)
    );
    assert_eq!(
        report.tier_consistency_report.declared_tier,
        Tier::Minimal
    );
}

#[test]
fn test_tier_preserved_unit_is_consistent() {
    let glue = indoc! {"
        def dispatch(event):
            handler = lookup(event.kind)
            return handler(event)
    "};
    let (code, analyzed) = scaffold(glue, UnitKind::Function, Tier::Detailed);
    let report = run(&code, &analyzed, glue, UnitKind::Function, Tier::Detailed);

    assert!(report.tier_consistency_report.issues.is_empty());
}
