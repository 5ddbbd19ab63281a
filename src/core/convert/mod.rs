//! Conversion patterns: reference implementation in, scaffolded exercise out.
//!
//! Each pattern is a pure function of `(unit, features, policy)` plus the
//! injected hint generator; repeated calls on the same input produce
//! byte-identical output.

mod algorithm;
mod class;
mod function;

use crate::core::analyze::AnalyzedUnit;
use crate::core::diag::Span;
use crate::core::hint::{Hint, HintGenerator};
use crate::core::policy::TierPolicy;
use crate::core::tree::visit::{walk_stmt, Visitor};
use crate::core::tree::{FunctionDef, Stmt, StmtKind, UnitTree};
use crate::core::unit::UnitKind;

/// A source region carried through scaffolding untouched. Flawed-example
/// regions are intentionally complete code kept for contrast; they are
/// exempt from failing the unit but still recorded by the verifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PreservedRegion {
    pub text: String,
    pub flawed_example: bool,
    pub span: Span,
}

/// The scaffolded exercise produced by one conversion pattern. Immutable
/// downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldedCode {
    pub signature: String,
    pub docstring: Option<String>,
    pub todo_markers: Vec<String>,
    pub hints: Vec<Hint>,
    pub preserved_regions: Vec<PreservedRegion>,
    /// Rendered scaffold text: signature, docstring, preserved regions and
    /// TODO markers, in source order.
    pub body: String,
}

/// Dispatches on the declared kind. The tree shape wins over an implausible
/// declaration: a `class` tree declared as anything else still scaffolds
/// class-wise, method by method.
pub fn convert(
    source: &str,
    unit: &AnalyzedUnit,
    kind: UnitKind,
    policy: &TierPolicy,
    hints: &HintGenerator<'_>,
) -> ScaffoldedCode {
    match (&unit.tree, kind) {
        (UnitTree::Class(def), _) => class::scaffold_class(source, def, unit, policy, hints),
        (UnitTree::Function(def), UnitKind::Algorithm) => {
            algorithm::scaffold_algorithm(source, def, &unit.features, policy, hints)
        }
        (UnitTree::Function(def), UnitKind::Test) => {
            test::scaffold_test(source, def, &unit.features, policy, hints)
        }
        (UnitTree::Function(def), _) => {
            function::scaffold_function(source, def, &unit.features, policy, hints)
        }
    }
}

// --- shared line helpers ---

/// The 1-based inclusive line range of a span, rendered verbatim.
pub(crate) fn slice_lines(source: &str, span: Span) -> String {
    let start = span.start.line.max(1);
    let end = span.end.line.max(start);
    source
        .lines()
        .skip(start - 1)
        .take(end - start + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body lines of a definition: everything after the header, as local text.
pub(crate) fn body_text(source: &str, def: &FunctionDef) -> (String, usize) {
    let first = def.header_span.end.line + 1;
    let last = def.span.end.line.max(first);
    let text = source
        .lines()
        .skip(first - 1)
        .take(last - first + 1)
        .collect::<Vec<_>>()
        .join("\n");
    (text, first)
}

pub(crate) fn indent_of(line: &str) -> String {
    line.chars().take_while(|ch| ch.is_whitespace()).collect()
}

/// Indentation for the body of a definition: header indent plus one level.
pub(crate) fn body_indent(signature: &str) -> String {
    let header_indent = signature
        .lines()
        .next()
        .map(indent_of)
        .unwrap_or_default();
    format!("{header_indent}    ")
}

#[cfg(test)]
#[path = "../../tests/convert/t_convert.rs"]
mod tests;

pub(crate) fn has_return_value(body: &[Stmt]) -> bool {
    struct ReturnScan {
        found: bool,
    }
    impl Visitor for ReturnScan {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            if let StmtKind::Return(Some(_)) = &stmt.kind {
                self.found = true;
            }
            walk_stmt(self, stmt);
        }

        fn visit_func_def(&mut self, _def: &FunctionDef) {
            // Nested defs return for themselves.
        }
    }
    let mut scan = ReturnScan { found: false };
    for stmt in body {
        scan.visit_stmt(stmt);
    }
    scan.found
}
