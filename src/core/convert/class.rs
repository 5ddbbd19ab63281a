use indexmap::IndexMap;

use crate::core::analyze::{call_names, extract_def, AnalyzedUnit};
use crate::core::hint::{fit_to_policy, Hint, HintCategory, HintGenerator};
use crate::core::policy::TierPolicy;
use crate::core::tree::{ClassDef, FunctionDef};

use super::function::scaffold_function_with_hints;
use super::{slice_lines, PreservedRegion, ScaffoldedCode};

/// Scaffolds each method independently through the function pattern, then
/// adds one class-level conceptual hint describing inter-method dependencies
/// and a suggested implementation order.
pub(super) fn scaffold_class(
    source: &str,
    def: &ClassDef,
    unit: &AnalyzedUnit,
    policy: &TierPolicy,
    hints: &HintGenerator<'_>,
) -> ScaffoldedCode {
    let signature = slice_lines(source, def.header_span);
    let docstring = def
        .docstring
        .as_ref()
        .map(|doc| slice_lines(source, doc.span));

    let mut todo_markers = Vec::new();
    let mut preserved_regions = Vec::new();
    let mut body = String::new();
    body.push_str(&signature);
    body.push('\n');
    if let Some(doc) = &docstring {
        body.push_str(doc);
        body.push('\n');
    }
    for attr in &def.body {
        // Class attributes are orchestration glue, kept verbatim.
        let text = slice_lines(source, attr.span);
        body.push_str(&text);
        body.push('\n');
        preserved_regions.push(PreservedRegion {
            text,
            flawed_example: false,
            span: attr.span,
        });
    }

    for (index, method) in def.methods.iter().enumerate() {
        let features = extract_def(method);
        let scaffolded =
            scaffold_function_with_hints(source, method, &features, policy, Vec::new());
        todo_markers.extend(scaffolded.todo_markers);
        preserved_regions.extend(scaffolded.preserved_regions);
        if index > 0 || docstring.is_some() || !def.body.is_empty() {
            body.push('\n');
        }
        body.push_str(&scaffolded.body);
        body.push('\n');
    }
    // Drop the trailing newline so repeated conversions render identically.
    while body.ends_with('\n') {
        body.pop();
    }

    let mut hint_list = hints.generate(&unit.features, policy);
    let order = implementation_order(&def.methods).join(", ");
    let dependency_hint = Hint::new(
        HintCategory::Conceptual,
        hints
            .registry()
            .render("conceptual.class-dependencies", &[("order", order.as_str())]),
    );
    let pos = hint_list
        .iter()
        .rposition(|h| h.category == HintCategory::Conceptual)
        .map(|p| p + 1)
        .unwrap_or(0);
    hint_list.insert(pos, dependency_hint);
    let hint_list = fit_to_policy(hint_list, policy);

    ScaffoldedCode {
        signature,
        docstring,
        todo_markers,
        hints: hint_list,
        preserved_regions,
        body,
    }
}

/// Callee-before-caller ordering over the intra-class call graph; ties and
/// cycles fall back to declaration order.
fn implementation_order(methods: &[FunctionDef]) -> Vec<String> {
    let names: Vec<String> = methods.iter().map(|m| m.name.clone()).collect();
    let mut callees: IndexMap<String, Vec<String>> = IndexMap::new();
    for method in methods {
        let within: Vec<String> = call_names(&method.body)
            .into_iter()
            .filter_map(|call| {
                let plain = call.strip_prefix("self.").unwrap_or(&call).to_string();
                if names.contains(&plain) && plain != method.name {
                    Some(plain)
                } else {
                    None
                }
            })
            .collect();
        callees.insert(method.name.clone(), within);
    }

    let mut order: Vec<String> = Vec::new();
    while order.len() < names.len() {
        let next = names
            .iter()
            .find(|name| {
                !order.contains(name)
                    && callees[name.as_str()]
                        .iter()
                        .all(|callee| order.contains(callee))
            })
            .or_else(|| names.iter().find(|name| !order.contains(name)));
        match next {
            Some(name) => order.push(name.clone()),
            None => break,
        }
    }
    order
}
