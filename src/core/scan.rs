//! Line-level scanning shared by the conversion patterns and the verifier:
//! logic-line counting, tagged-region discovery, and normalized literal
//! matching for leak checks.

use crate::core::diag::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Preserve,
    FlawedExample,
}

/// A tagged region, inclusive of its start/end marker lines. Lines are
/// 1-based.
#[derive(Debug, Clone)]
pub struct Region {
    pub kind: RegionKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl Region {
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    pub fn span(&self) -> Span {
        Span::lines(self.start_line, self.end_line)
    }
}

fn tag_of(line: &str) -> Option<(RegionKind, bool)> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let tag = trimmed.trim_start_matches('#').trim();
    match tag {
        "preserve:start" => Some((RegionKind::Preserve, true)),
        "preserve:end" => Some((RegionKind::Preserve, false)),
        "flawed-example:start" => Some((RegionKind::FlawedExample, true)),
        "flawed-example:end" => Some((RegionKind::FlawedExample, false)),
        _ => None,
    }
}

/// Scans for `# preserve:start`/`# preserve:end` and
/// `# flawed-example:start`/`# flawed-example:end` marker pairs. An unclosed
/// region extends to the last line.
pub fn region_tags(source: &str) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut open: Option<(RegionKind, usize)> = None;
    let mut last_line = 0;
    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        match tag_of(line) {
            Some((kind, true)) => {
                if open.is_none() {
                    open = Some((kind, line_no));
                }
            }
            Some((kind, false)) => {
                if let Some((open_kind, start_line)) = open {
                    if open_kind == kind {
                        regions.push(Region {
                            kind,
                            start_line,
                            end_line: line_no,
                        });
                        open = None;
                    }
                }
            }
            None => {}
        }
    }
    if let Some((kind, start_line)) = open {
        regions.push(Region {
            kind,
            start_line,
            end_line: last_line,
        });
    }
    regions
}

/// One line that carries actual logic: not blank, not a comment, not part of
/// a (triple-quoted) docstring, and not a `def`/`class` header.
#[derive(Debug, Clone)]
pub struct LogicLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// Extracts the logic lines of a source fragment. Lines inside any of the
/// given regions are skipped. Triple-quoted strings are tracked with a
/// line-level state machine; string data spanning lines is deliberately
/// treated like documentation, since neither counts as logic a learner must
/// reproduce.
pub fn logic_lines<'a>(source: &'a str, skip: &[Region]) -> Vec<LogicLine<'a>> {
    let mut out = Vec::new();
    let mut in_triple = false;
    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        let quotes = count_triple_quotes(trimmed);
        if in_triple {
            if quotes % 2 == 1 {
                in_triple = false;
            }
            continue;
        }
        if quotes > 0 {
            if quotes % 2 == 1 {
                in_triple = true;
            }
            // A line opening (or fully containing) a triple-quoted string is
            // documentation, not logic.
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with("def ") || trimmed.starts_with("class ") || trimmed.starts_with('@')
        {
            continue;
        }
        if skip.iter().any(|region| region.contains_line(line_no)) {
            continue;
        }
        out.push(LogicLine {
            number: line_no,
            text: trimmed,
        });
    }
    out
}

fn count_triple_quotes(line: &str) -> usize {
    let double = line.matches("\"\"\"").count();
    let single = line.matches("'''").count();
    double + single
}

/// Collapses a code line to its significant characters for literal matching.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// True when `content` contains `line` as a whitespace-normalized literal
/// substring, provided the line is long enough to be distinctive.
pub fn contains_literal(content: &str, line: &str, min_literal_len: usize) -> bool {
    let needle = normalize(line);
    if needle.chars().count() < min_literal_len {
        return false;
    }
    normalize(content).contains(&needle)
}

#[cfg(test)]
#[path = "../tests/t_scan.rs"]
mod tests;
