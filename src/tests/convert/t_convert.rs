use super::*;

use indoc::indoc;

use crate::core::analyze::{PythonAnalyzer, StructuralAnalyzer};
use crate::core::hint::{HintCategory, HintGenerator, TemplateRegistry};
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

fn scaffold(source: &str, kind: UnitKind, tier: Tier) -> ScaffoldedCode {
    let analyzed = PythonAnalyzer
        .analyze(source, kind)
        .expect("Failed to analyze");
    let registry = TemplateRegistry::builtin();
    let hints = HintGenerator::new(&registry);
    convert(source, &analyzed, kind, &tier.policy(), &hints)
}

#[test]
fn test_function_signature_and_docstring_verbatim() {
    let code = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);

    assert_eq!(
        code.signature,
        "def average(values: list[float]) -> float:"
    );
    assert_eq!(
        code.docstring.as_deref(),
        Some("    \"\"\"Return the arithmetic mean of values.\"\"\"")
    );
    assert!(code.body.starts_with(&code.signature));
}

#[test]
fn test_function_body_logic_removed() {
    let code = scaffold(AVERAGE, UnitKind::Function, Tier::Moderate);

    assert!(!code.body.contains("total / count"));
    assert!(!code.body.contains("total += value"));
    assert!(code.body.trim_end().ends_with("pass"));
}

#[test]
fn test_function_todo_markers_fixed_order() {
    let code = scaffold(AVERAGE, UnitKind::Function, Tier::Moderate);

    let slots: Vec<&str> = code
        .todo_markers
        .iter()
        .map(|m| {
            m.trim_start_matches("# TODO(")
                .split(')')
                .next()
                .expect("Expected a slot name")
        })
        .collect();
    assert_eq!(
        slots,
        vec!["validate", "iterate", "handle-errors", "transform", "return"]
    );
}

#[test]
fn test_function_markers_rendered_at_body_indent() {
    let code = scaffold(AVERAGE, UnitKind::Function, Tier::Moderate);

    let expected = textwrap::indent(&(code.todo_markers.join("\n") + "\n"), "    ");
    assert!(code.body.contains(&expected));
    assert!(code.body.ends_with("    pass"));
}

#[test]
fn test_function_markers_capped_by_logic_lines() {
    // Six logic lines in AVERAGE; a tighter body must cap the marker count.
    let short = indoc! {"
        def f(a, b, c, d):
            if a:
                x = g(a)
            while b:
                b = h(b)
            y = i(c)
            z = j(d)
            w = k(x)
            v = l(y)
            return m(z, w, v)
    "};
    let code = scaffold(short, UnitKind::Function, Tier::Minimal);

    let logic_count = 9;
    assert!(code.todo_markers.len() <= logic_count);
    assert!(!code.todo_markers.is_empty());
}

#[test]
fn test_function_short_body_preserved_as_is() {
    let glue = indoc! {"
        def dispatch(event):
            handler = lookup(event.kind)
            return handler(event)
    "};
    let code = scaffold(glue, UnitKind::Function, Tier::Moderate);

    assert!(code.todo_markers.is_empty());
    assert!(code.body.contains("handler = lookup(event.kind)"));
    assert_eq!(code.preserved_regions.len(), 1);
}

#[test]
fn test_function_tagged_preserve_region_copied_through() {
    let source = indoc! {"
        def load(path):
            # preserve:start
            import json
            # preserve:end
            raw = open(path).read()
            data = json.loads(raw)
            checked = validate_schema(data)
            merged = merge_defaults(checked)
            ordered = sort_keys(merged)
            return freeze(ordered)
    "};
    let code = scaffold(source, UnitKind::Function, Tier::Moderate);

    assert!(code.body.contains("import json"));
    assert_eq!(code.preserved_regions.len(), 1);
    assert!(!code.preserved_regions[0].flawed_example);
    assert!(!code.body.contains("json.loads"));
}

#[test]
fn test_function_flawed_example_region_kept_and_marked() {
    let source = indoc! {"
        def lookup(table, key):
            # flawed-example:start
            for k in table:
                if k == key:
                    return table[k]
            # flawed-example:end
            found = probe(table, key)
            checked = verify(found)
            logged = audit(checked)
            cached = store(logged)
            ranked = score(cached)
            return unwrap(ranked)
    "};
    let code = scaffold(source, UnitKind::Function, Tier::Moderate);

    assert_eq!(code.preserved_regions.len(), 1);
    assert!(code.preserved_regions[0].flawed_example);
    assert!(code.body.contains("if k == key:"));
}

#[test]
fn test_function_example_comment_only_when_detailed() {
    let detailed = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    let moderate = scaffold(AVERAGE, UnitKind::Function, Tier::Moderate);

    assert!(detailed.body.contains("# Example:"));
    assert!(!moderate.body.contains("# Example:"));
}

#[test]
fn test_convert_is_deterministic() {
    let first = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);
    let second = scaffold(AVERAGE, UnitKind::Function, Tier::Detailed);

    assert_eq!(first, second);
}

#[test]
fn test_algorithm_nested_loop_adds_complexity_hint() {
    let source = indoc! {"
        def pair_sums(items):
            sums = []
            for a in items:
                for b in items:
                    if a != b:
                        sums.append(a + b)
            return sums
    "};
    let code = scaffold(source, UnitKind::Algorithm, Tier::Moderate);

    let conceptual: Vec<&str> = code
        .hints
        .iter()
        .filter(|h| h.category == HintCategory::Conceptual)
        .map(|h| h.content.as_str())
        .collect();
    assert!(
        conceptual.iter().any(|c| c.contains("nested") || c.contains("recursive")),
        "no complexity hint in {conceptual:?}"
    );
}

#[test]
fn test_algorithm_detailed_adds_pseudocode_hint() {
    let source = indoc! {"
        def fib(n: int) -> int:
            if n <= 1:
                return n
            a = fib(n - 1)
            b = fib(n - 2)
            sum_ab = a + b
            memo = record(n, sum_ab)
            return sum_ab
    "};
    let code = scaffold(source, UnitKind::Algorithm, Tier::Detailed);

    assert!(code
        .hints
        .iter()
        .filter(|h| h.category == HintCategory::Approach)
        .any(|h| h.content.to_lowercase().contains("pseudocode")));
}

#[test]
fn test_algorithm_hint_count_still_within_band() {
    let source = indoc! {"
        def pair_sums(items):
            sums = []
            for a in items:
                for b in items:
                    if a != b:
                        sums.append(a + b)
            return sums
    "};
    for tier in Tier::ALL {
        let policy = tier.policy();
        let code = scaffold(source, UnitKind::Algorithm, tier);
        assert!(
            code.hints.len() >= policy.min_hints && code.hints.len() <= policy.max_hints,
            "{tier}: {} hints outside band",
            code.hints.len()
        );
    }
}

const STACK: &str = indoc! {r#"
    class Stack:
        """A bounded LIFO container."""

        limit = 100

        def push(self, item):
            if self.is_full():
                raise OverflowError("stack full")
            slot = self.prepare_slot()
            tagged = self.tag(item)
            self.items.append(tagged)
            self.count = self.count + 1
            return self.count

        def is_full(self):
            return len(self.items) >= self.limit

        def prepare_slot(self):
            return len(self.items)

        def tag(self, item):
            return (self.count, item)
"#};

#[test]
fn test_class_each_method_scaffolded() {
    let code = scaffold(STACK, UnitKind::Class, Tier::Moderate);

    // The long method is scaffolded, the short ones preserved.
    assert!(!code.body.contains("self.items.append(tagged)"));
    assert!(code.body.contains("def push(self, item):"));
    assert!(code.body.contains("return len(self.items) >= self.limit"));
}

#[test]
fn test_class_attributes_preserved() {
    let code = scaffold(STACK, UnitKind::Class, Tier::Moderate);

    assert!(code.body.contains("limit = 100"));
    assert!(code
        .preserved_regions
        .iter()
        .any(|r| r.text.contains("limit = 100")));
}

#[test]
fn test_class_dependency_hint_orders_callee_first() {
    let code = scaffold(STACK, UnitKind::Class, Tier::Detailed);

    let order_hint = code
        .hints
        .iter()
        .find(|h| h.content.contains("implementation order"))
        .expect("Expected a class dependency hint");
    let position = |name: &str| {
        order_hint
            .content
            .find(name)
            .unwrap_or_else(|| panic!("{name} missing from {}", order_hint.content))
    };
    assert!(position("is_full") < position("push"));
    assert!(position("tag") < position("push"));
}

#[test]
fn test_class_tree_wins_over_declared_kind() {
    let code = scaffold(STACK, UnitKind::Function, Tier::Moderate);

    // Declared as a function, but the parsed unit is a class.
    assert!(code.signature.starts_with("class Stack"));
}

#[test]
fn test_test_pattern_preserves_arrange_scaffolds_act_assert() {
    let source = indoc! {r#"
        def test_average_of_mixed_values():
            """Averaging a mixed list lands between its extremes."""
            values = [1.0, 2.0, 3.0]
            padded = values + [4.0]
            weights = make_weights(len(padded))
            scaled = apply_weights(padded, weights)
            result = average(scaled)
            assert result > 1.0
            assert result < 4.0
    "#};
    let code = scaffold(source, UnitKind::Test, Tier::Moderate);

    assert!(code.signature.contains("test_average_of_mixed_values"));
    assert!(code.body.contains("values = [1.0, 2.0, 3.0]"));
    assert!(!code.body.contains("result = average(scaled)"));
    assert!(!code.body.contains("assert result > 1.0"));
    assert!(code.todo_markers.iter().any(|m| m.contains("TODO(act)")));
    assert!(code.todo_markers.iter().any(|m| m.contains("TODO(assert)")));
    assert_eq!(code.preserved_regions.len(), 1);
}

#[test]
fn test_test_pattern_short_test_preserved_whole() {
    let source = indoc! {"
        def test_empty_average_raises():
            values = []
            try_raises(average, values)
    "};
    let code = scaffold(source, UnitKind::Test, Tier::Minimal);

    assert!(code.todo_markers.is_empty());
    assert!(code.body.contains("try_raises(average, values)"));
}
