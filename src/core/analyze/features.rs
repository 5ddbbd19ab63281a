use crate::core::tree::visit::{walk_expr, walk_stmt, Visitor};
use crate::core::tree::{Expr, ExprKind, FunctionDef, Stmt, StmtKind, UnitTree};

/// Calls into this vocabulary, combined with a loop, mark a unit as
/// sort-like. A heuristic, not a guarantee.
const ORDERING_VOCABULARY: &[&str] = &[
    "sort", "sorted", "swap", "compare", "cmp", "partition", "merge", "heapify",
];

#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub annotation: Option<String>,
    pub is_receiver: bool,
}

/// Structural profile of one source unit, derived once by the analyzer and
/// never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct StructuralFeatureSet {
    pub has_loop: bool,
    pub has_nested_loop: bool,
    pub has_conditional: bool,
    pub has_error_handling: bool,
    pub has_recursion: bool,
    pub is_sort_like: bool,
    pub params: Vec<ParamInfo>,
    pub return_annotation: Option<String>,
}

impl StructuralFeatureSet {
    /// Names of the detected boolean features, for lexical relevance checks.
    pub fn detected_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.has_loop {
            names.push("loop");
        }
        if self.has_nested_loop {
            names.push("nested");
        }
        if self.has_conditional {
            names.push("condition");
        }
        if self.has_error_handling {
            names.push("error");
        }
        if self.has_recursion {
            names.push("recursion");
        }
        if self.is_sort_like {
            names.push("sort");
        }
        names
    }
}

/// Derives the feature set of a single definition, e.g. one method of a
/// class unit.
pub fn extract_def(def: &FunctionDef) -> StructuralFeatureSet {
    let mut scan = FeatureScan::default();
    scan.visit_func_def(def);

    let mut features = scan.features;
    features.has_recursion = calls_itself(def);
    features.is_sort_like = features.has_loop && scan.sort_signal;
    features.params = param_infos(def);
    features.return_annotation = def.return_annotation.clone();
    features
}

/// Derives the feature set by walking the parsed tree.
pub fn extract(tree: &UnitTree) -> StructuralFeatureSet {
    let mut scan = FeatureScan::default();
    scan.visit_unit(tree);

    let mut features = scan.features;
    features.has_recursion = tree.defs().iter().any(|def| calls_itself(def));
    features.is_sort_like = features.has_loop && scan.sort_signal;

    match tree {
        UnitTree::Function(def) => {
            features.params = param_infos(def);
            features.return_annotation = def.return_annotation.clone();
        }
        UnitTree::Class(def) => {
            for method in &def.methods {
                features.params.extend(param_infos(method));
            }
        }
    }
    features
}

fn param_infos(def: &FunctionDef) -> Vec<ParamInfo> {
    def.params
        .iter()
        .enumerate()
        .map(|(index, param)| ParamInfo {
            name: param.name.clone(),
            annotation: param.annotation.clone(),
            is_receiver: param.is_receiver(def.is_method, index),
        })
        .collect()
}

/// Callee names (dotted form) appearing anywhere in the given statements.
pub fn call_names(stmts: &[Stmt]) -> Vec<String> {
    struct CallScan {
        names: Vec<String>,
    }
    impl Visitor for CallScan {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Call { callee, .. } = &expr.kind {
                if let Some(name) = callee.dotted_name() {
                    self.names.push(name);
                }
            }
            walk_expr(self, expr);
        }
    }
    let mut scan = CallScan { names: Vec::new() };
    for stmt in stmts {
        scan.visit_stmt(stmt);
    }
    scan.names
}

fn calls_itself(def: &FunctionDef) -> bool {
    let self_call = format!("self.{}", def.name);
    call_names(&def.body)
        .iter()
        .any(|name| *name == def.name || *name == self_call)
}

#[derive(Default)]
struct FeatureScan {
    features: StructuralFeatureSet,
    loop_depth: usize,
    sort_signal: bool,
}

impl FeatureScan {
    fn enter_loop(&mut self) {
        self.features.has_loop = true;
        if self.loop_depth > 0 {
            self.features.has_nested_loop = true;
        }
        self.loop_depth += 1;
    }

    fn exit_loop(&mut self) {
        self.loop_depth -= 1;
    }

    fn check_swap(&mut self, targets: &[Expr], value: &Expr) {
        // `a, b = b, a` style parallel assignment.
        let Some(target) = targets.first() else {
            return;
        };
        let (ExprKind::Tuple(lhs), ExprKind::Tuple(rhs)) = (&target.kind, &value.kind) else {
            return;
        };
        if lhs.len() < 2 || lhs.len() != rhs.len() {
            return;
        }
        let lhs_names: Vec<_> = lhs.iter().filter_map(swap_operand).collect();
        let rhs_names: Vec<_> = rhs.iter().filter_map(swap_operand).collect();
        if lhs_names.len() != lhs.len() || rhs_names.len() != rhs.len() {
            return;
        }
        let mut sorted_lhs = lhs_names.clone();
        let mut sorted_rhs = rhs_names.clone();
        sorted_lhs.sort();
        sorted_rhs.sort();
        if sorted_lhs == sorted_rhs && lhs_names != rhs_names {
            self.sort_signal = true;
        }
    }
}

/// Renders a swappable operand (name or indexed name) to a comparable key.
fn swap_operand(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Name(name) => Some(name.clone()),
        ExprKind::Index { target, index } => {
            let base = target.dotted_name()?;
            let key = match &index.kind {
                ExprKind::Name(name) => name.clone(),
                ExprKind::Int(value) => value.to_string(),
                ExprKind::Binary { lhs, rhs, .. } => {
                    format!("{}?{}", swap_operand(lhs)?, swap_operand(rhs)?)
                }
                _ => return None,
            };
            Some(format!("{base}[{key}]"))
        }
        ExprKind::Int(value) => Some(value.to_string()),
        _ => None,
    }
}

impl Visitor for FeatureScan {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::For { .. } | StmtKind::While { .. } => {
                self.enter_loop();
                walk_stmt(self, stmt);
                self.exit_loop();
                return;
            }
            StmtKind::If { .. } => {
                self.features.has_conditional = true;
            }
            StmtKind::Try { .. } | StmtKind::Raise(_) => {
                self.features.has_error_handling = true;
            }
            StmtKind::Assign { targets, value, augmented } => {
                if augmented.is_none() {
                    self.check_swap(targets, value);
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Comprehension { .. } => {
                self.enter_loop();
                walk_expr(self, expr);
                self.exit_loop();
                return;
            }
            ExprKind::Ternary { .. } => {
                self.features.has_conditional = true;
            }
            ExprKind::Compare { lhs, rhs, .. } => {
                // Comparing two indexed elements is an ordering signal.
                if matches!(lhs.kind, ExprKind::Index { .. })
                    && matches!(rhs.kind, ExprKind::Index { .. })
                {
                    self.sort_signal = true;
                }
            }
            ExprKind::Call { callee, .. } => {
                if let Some(name) = callee.dotted_name() {
                    let last = name.rsplit('.').next().unwrap_or(&name);
                    if ORDERING_VOCABULARY.contains(&last) {
                        self.sort_signal = true;
                    }
                }
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}
