use super::*;

use indoc::indoc;

use crate::core::analyze::{PythonAnalyzer, StructuralAnalyzer};
use crate::core::unit::UnitKind;

fn features_of(source: &str) -> StructuralFeatureSet {
    PythonAnalyzer
        .analyze(source, UnitKind::Function)
        .expect("Failed to analyze")
        .features
}

#[test]
fn test_features_plain_function() {
    let features = features_of(indoc! {"
        def f(x):
            return x
    "});

    assert!(!features.has_loop);
    assert!(!features.has_conditional);
    assert!(!features.has_error_handling);
    assert!(!features.has_recursion);
    assert!(!features.is_sort_like);
}

#[test]
fn test_features_loop_and_conditional() {
    let features = features_of(indoc! {"
        def f(items):
            total = 0
            for item in items:
                if item > 0:
                    total += item
            return total
    "});

    assert!(features.has_loop);
    assert!(!features.has_nested_loop);
    assert!(features.has_conditional);
}

#[test]
fn test_features_nested_loop() {
    let features = features_of(indoc! {"
        def f(grid):
            for row in grid:
                for cell in row:
                    print(cell)
    "});

    assert!(features.has_nested_loop);
}

#[test]
fn test_features_comprehension_counts_as_loop() {
    let features = features_of(indoc! {"
        def f(items):
            return [x * 2 for x in items]
    "});

    assert!(features.has_loop);
}

#[test]
fn test_features_error_handling_via_try() {
    let features = features_of(indoc! {"
        def f(x):
            try:
                return 10 / x
            except ZeroDivisionError:
                return 0
    "});

    assert!(features.has_error_handling);
}

#[test]
fn test_features_error_handling_via_raise() {
    let features = features_of(indoc! {"
        def f(x):
            if x < 0:
                raise ValueError(\"negative\")
            return x
    "});

    assert!(features.has_error_handling);
}

#[test]
fn test_features_recursion() {
    let features = features_of(indoc! {"
        def fact(n):
            if n <= 1:
                return 1
            return n * fact(n - 1)
    "});

    assert!(features.has_recursion);
}

#[test]
fn test_features_method_recursion_through_self() {
    let source = indoc! {"
        class Walker:
            def walk(self, node):
                for child in node.children:
                    self.walk(child)
    "};
    let analyzed = PythonAnalyzer
        .analyze(source, UnitKind::Class)
        .expect("Failed to analyze");

    assert!(analyzed.features.has_recursion);
}

#[test]
fn test_features_sort_like_needs_loop_and_vocabulary() {
    let with_loop = features_of(indoc! {"
        def order(items):
            for i in range(len(items)):
                swap(items, i)
    "});
    assert!(with_loop.is_sort_like);

    // Vocabulary without a loop is not enough.
    let without_loop = features_of(indoc! {"
        def order(items):
            return sorted(items)
    "});
    assert!(!without_loop.is_sort_like);
}

#[test]
fn test_features_sort_like_via_index_compare() {
    let features = features_of(indoc! {"
        def bubble(items):
            for i in range(len(items)):
                if items[i] > items[i + 1]:
                    items[i], items[i + 1] = items[i + 1], items[i]
    "});

    assert!(features.is_sort_like);
}

#[test]
fn test_features_params_and_annotations() {
    let features = features_of(indoc! {"
        def f(a: int, b) -> int:
            return a + b
    "});

    assert_eq!(features.params.len(), 2);
    assert_eq!(features.params[0].annotation.as_deref(), Some("int"));
    assert_eq!(features.params[1].annotation, None);
    assert_eq!(features.return_annotation.as_deref(), Some("int"));
}

#[test]
fn test_features_receiver_flagged() {
    let source = indoc! {"
        class C:
            def m(self, x):
                return x
    "};
    let analyzed = PythonAnalyzer
        .analyze(source, UnitKind::Class)
        .expect("Failed to analyze");

    let receiver = &analyzed.features.params[0];
    assert_eq!(receiver.name, "self");
    assert!(receiver.is_receiver);
    assert!(!analyzed.features.params[1].is_receiver);
}

#[test]
fn test_features_class_flags_are_union_of_methods() {
    let source = indoc! {"
        class C:
            def a(self):
                for i in range(3):
                    pass

            def b(self, x):
                if x:
                    raise ValueError(x)
    "};
    let analyzed = PythonAnalyzer
        .analyze(source, UnitKind::Class)
        .expect("Failed to analyze");

    assert!(analyzed.features.has_loop);
    assert!(analyzed.features.has_conditional);
    assert!(analyzed.features.has_error_handling);
}

#[test]
fn test_analyze_malformed_source_is_error() {
    let result = PythonAnalyzer.analyze("def broken(:\n", UnitKind::Function);
    assert!(result.is_err());
}

#[test]
fn test_detected_names() {
    let features = features_of(indoc! {"
        def f(items):
            for item in items:
                if item:
                    pass
    "});

    let names = features.detected_names();
    assert!(names.contains(&"loop"));
    assert!(names.contains(&"condition"));
    assert!(!names.contains(&"recursion"));
}
