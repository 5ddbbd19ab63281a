use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::core::convert::ScaffoldedCode;
use crate::core::diag::Span;
use crate::core::scan::{self, LogicLine, RegionKind};

use super::VerifierConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Low,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::High => "HIGH",
            Severity::Low => "LOW",
        };
        write!(f, "{name}")
    }
}

/// Complete logic found where scaffolding was supposed to remove it. The
/// span is line-based within the scaffolded body.
#[derive(Debug, Clone)]
pub struct SolutionViolation {
    pub span: Span,
    pub severity: Severity,
    pub snippet: String,
}

/// Walks the scaffolded body for logic that survived scaffolding. Lines
/// inside tagged preserve regions or belonging to a recorded preserved
/// region are exempt; flawed-example regions downgrade to LOW, recorded but
/// not batch-failing.
pub(super) fn detect(code: &ScaffoldedCode, config: &VerifierConfig) -> Vec<SolutionViolation> {
    let body = code.body.as_str();
    let regions = scan::region_tags(body);
    let preserve_tags: Vec<_> = regions
        .iter()
        .filter(|r| r.kind == RegionKind::Preserve)
        .cloned()
        .collect();
    let flawed_tags: Vec<_> = regions
        .iter()
        .filter(|r| r.kind == RegionKind::FlawedExample)
        .cloned()
        .collect();

    let mut preserved: HashSet<String> = HashSet::new();
    for region in code.preserved_regions.iter().filter(|r| !r.flawed_example) {
        for line in region.text.lines() {
            preserved.insert(scan::normalize(line));
        }
    }

    let mut outside = Vec::new();
    let mut inside_flawed = Vec::new();
    for line in scan::logic_lines(body, &preserve_tags) {
        if is_trivial(line.text) || preserved.contains(&scan::normalize(line.text)) {
            continue;
        }
        if flawed_tags.iter().any(|r| r.contains_line(line.number)) {
            inside_flawed.push(line);
        } else {
            outside.push(line);
        }
    }

    let mut violations = Vec::new();
    if non_trivial(&outside, config) {
        violations.push(violation(&outside, Severity::High));
    }
    if !inside_flawed.is_empty() {
        violations.push(violation(&inside_flawed, Severity::Low));
    }
    violations
}

fn is_trivial(text: &str) -> bool {
    matches!(text, "pass" | "...")
}

/// Logic worth hiding: more lines than the preservation threshold, or the
/// loop + conditional + non-constant-return triple.
fn non_trivial(lines: &[LogicLine<'_>], config: &VerifierConfig) -> bool {
    if lines.len() > config.max_preserved_logic_lines {
        return true;
    }
    let has_loop = lines
        .iter()
        .any(|l| l.text.starts_with("for ") || l.text.starts_with("while "));
    let has_conditional = lines
        .iter()
        .any(|l| l.text.starts_with("if ") || l.text.starts_with("elif "));
    let returns_computed = lines.iter().any(|l| {
        l.text
            .strip_prefix("return ")
            .map(|expr| !is_constant_expr(expr.trim()))
            .unwrap_or(false)
    });
    has_loop && has_conditional && returns_computed
}

fn is_constant_expr(expr: &str) -> bool {
    matches!(expr, "True" | "False" | "None")
        || expr.parse::<f64>().is_ok()
        || (expr.len() >= 2
            && ((expr.starts_with('"') && expr.ends_with('"'))
                || (expr.starts_with('\'') && expr.ends_with('\''))))
}

fn violation(lines: &[LogicLine<'_>], severity: Severity) -> SolutionViolation {
    let first = lines.first().map(|l| l.number).unwrap_or(1);
    let last = lines.last().map(|l| l.number).unwrap_or(first);
    let snippet = lines
        .iter()
        .take(3)
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n");
    SolutionViolation {
        span: Span::lines(first, last),
        severity,
        snippet,
    }
}
