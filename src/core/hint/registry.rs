use indexmap::IndexMap;

/// Named hint templates with `{placeholder}` substitution.
///
/// Constructed explicitly and passed into the engine; deliberately not a
/// module-level global, so engines running on separate workers never share
/// mutable registry state.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: IndexMap<String, String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: IndexMap::new(),
        }
    }

    /// The stock template set used by the shipped patterns.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for &(key, template) in BUILTIN_TEMPLATES {
            registry.insert(key, template);
        }
        registry
    }

    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Keys and raw template text, in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .iter()
            .map(|(key, template)| (key.as_str(), template.as_str()))
    }

    /// Renders a template, replacing each `{name}` with its value. Unknown
    /// keys render as an empty string.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let Some(template) = self.get(key) else {
            return String::new();
        };
        let mut out = template.to_string();
        for (name, value) in vars {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "conceptual.purpose",
        "Before writing anything, describe in one sentence what this exercise must accomplish; the structure you need involves {features}.",
    ),
    (
        "conceptual.purpose.plain",
        "Before writing anything, describe in one sentence what this exercise must accomplish and what its inputs and output are.",
    ),
    (
        "conceptual.failure",
        "Decide how invalid or unexpected input should surface: think through the error cases before the happy path, and which failures the caller must see.",
    ),
    (
        "conceptual.complexity",
        "This shape of solution has a cost that grows faster than the input size suggests; reason about how the nested or recursive work multiplies before committing to it.",
    ),
    (
        "conceptual.class-dependencies",
        "The methods here depend on one another; a workable implementation order is: {order}.",
    ),
    (
        "approach.decompose",
        "Work through one small concrete input by hand first, then translate each manual step into code covering {features}.",
    ),
    (
        "approach.decompose.plain",
        "Work through one small concrete input by hand first, then translate each manual step you performed into one line of code.",
    ),
    (
        "approach.pseudocode",
        "Write the whole routine as numbered pseudocode comments before any real code, then replace one numbered line at a time.",
    ),
    (
        "implementation.guard",
        "Start the body with a guard clause pattern: check the degenerate and error inputs first and leave early, so the main logic stays unindented.",
    ),
    (
        "implementation.loop",
        "Choose what state the loop must carry between iterations, and name that variable before writing the loop header.",
    ),
    (
        "implementation.condition",
        "List every branch the condition splits into and make sure each branch either produces a value or raises; none may fall through silently.",
    ),
    (
        "implementation.base-case",
        "Write the recursion base case first and test it alone; only then add the recursive step that shrinks the input.",
    ),
    (
        "implementation.swap",
        "An in-place element swap needs no temporary in this language; express the sort step as a single parallel assignment.",
    ),
    (
        "implementation.accumulator",
        "Introduce an accumulator with the correct identity value and update it exactly once per element processed.",
    ),
    (
        "implementation.small-steps",
        "Implement the marked steps one at a time and run whatever checks you have after each, instead of writing the whole body at once.",
    ),
    (
        "resource.reading",
        "Review your course notes on {features} and the standard library reference for the builtins you are about to use.",
    ),
    (
        "resource.reading.plain",
        "Review the chapter section this exercise came from and the standard library reference for the builtins you are about to use.",
    ),
];
