use crate::core::analyze::StructuralFeatureSet;
use crate::core::diag::Span;
use crate::core::hint::HintGenerator;
use crate::core::policy::TierPolicy;
use crate::core::scan::{self, Region, RegionKind};
use crate::core::tree::FunctionDef;

use super::{
    body_indent, body_text, has_return_value, slice_lines, PreservedRegion, ScaffoldedCode,
};

/// Scaffolds one function: signature and docstring verbatim, body replaced
/// with one TODO marker per detected structural feature, tagged regions
/// copied through untouched.
pub(super) fn scaffold_function(
    source: &str,
    def: &FunctionDef,
    features: &StructuralFeatureSet,
    policy: &TierPolicy,
    hints: &HintGenerator<'_>,
) -> ScaffoldedCode {
    let hint_list = hints.generate(features, policy);
    scaffold_function_with_hints(source, def, features, policy, hint_list)
}

pub(super) fn scaffold_function_with_hints(
    source: &str,
    def: &FunctionDef,
    features: &StructuralFeatureSet,
    policy: &TierPolicy,
    hint_list: Vec<crate::core::hint::Hint>,
) -> ScaffoldedCode {
    let signature = slice_lines(source, def.header_span);
    let docstring = def
        .docstring
        .as_ref()
        .map(|doc| slice_lines(source, doc.span));

    let (body, body_first_line) = body_text(source, def);
    let regions = scan::region_tags(&body);
    let logic = scan::logic_lines(&body, &regions);

    let preserved_regions: Vec<PreservedRegion> = regions
        .iter()
        .map(|region| PreservedRegion {
            text: region_text(&body, region),
            flawed_example: region.kind == RegionKind::FlawedExample,
            span: Span::lines(
                region.start_line + body_first_line - 1,
                region.end_line + body_first_line - 1,
            ),
        })
        .collect();

    // Short bodies are orchestration glue, not a solution worth hiding.
    if logic.len() <= policy.max_preserved_logic_lines {
        let mut preserved_regions = preserved_regions;
        if !body.is_empty() {
            preserved_regions.push(PreservedRegion {
                text: body.clone(),
                flawed_example: false,
                span: Span::lines(body_first_line, def.span.end.line),
            });
        }
        return ScaffoldedCode {
            signature,
            docstring,
            todo_markers: Vec::new(),
            hints: hint_list,
            preserved_regions,
            body: slice_lines(source, def.span),
        };
    }

    let markers = todo_markers(features, has_return_value(&def.body), logic.len());
    let indent = body_indent(&signature);

    let mut out = String::new();
    out.push_str(&signature);
    out.push('\n');
    if let Some(doc) = &docstring {
        out.push_str(doc);
        out.push('\n');
    }
    for region in &preserved_regions {
        out.push_str(&region.text);
        out.push('\n');
    }
    for marker in &markers {
        out.push_str(&format!("{indent}{marker}\n"));
    }
    if policy.includes_examples {
        push_example(&mut out, &indent, def);
    }
    out.push_str(&format!("{indent}pass"));

    ScaffoldedCode {
        signature,
        docstring,
        todo_markers: markers,
        hints: hint_list,
        preserved_regions,
        body: out,
    }
}

fn region_text(body: &str, region: &Region) -> String {
    body.lines()
        .skip(region.start_line - 1)
        .take(region.end_line - region.start_line + 1)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fixed marker order: validation, iteration, error handling, core
/// transform, return. Never more markers than the body had logic lines.
fn todo_markers(
    features: &StructuralFeatureSet,
    returns_value: bool,
    logic_line_count: usize,
) -> Vec<String> {
    let mut markers = Vec::new();
    let has_real_params = features.params.iter().any(|p| !p.is_receiver);
    if has_real_params || features.has_conditional {
        markers.push("# TODO(validate): check the inputs before using them".to_string());
    }
    if features.has_loop {
        markers.push("# TODO(iterate): process each element".to_string());
    }
    if features.has_error_handling {
        markers.push("# TODO(handle-errors): deal with the failure cases".to_string());
    }
    markers.push("# TODO(transform): compute the result".to_string());
    if returns_value {
        markers.push("# TODO(return): produce the final value".to_string());
    }
    markers.truncate(logic_line_count.max(1));
    markers
}

/// A worked usage example, emitted only under the Detailed policy. Comment
/// lines only, so it never counts as remaining logic.
pub(super) fn push_example(out: &mut String, indent: &str, def: &FunctionDef) {
    let args = def
        .params
        .iter()
        .enumerate()
        .filter(|(index, param)| !param.is_receiver(def.is_method, *index))
        .map(|(_, param)| param.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("{indent}# Example:\n"));
    out.push_str(&format!("{indent}#   {}({})\n", def.name, args));
}
