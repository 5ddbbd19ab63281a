use crate::core::tree::*;

/// Tree visitor with default traversal helpers.
///
/// Implement the methods you care about (e.g. `visit_expr`) and call the
/// corresponding `walk_*` function to recurse into children.
pub trait Visitor {
    fn visit_unit(&mut self, unit: &UnitTree) {
        walk_unit(self, unit)
    }

    fn visit_func_def(&mut self, def: &FunctionDef) {
        walk_func_def(self, def)
    }

    fn visit_class_def(&mut self, def: &ClassDef) {
        walk_class_def(self, def)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt)
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr)
    }
}

pub fn walk_unit<V: Visitor + ?Sized>(visitor: &mut V, unit: &UnitTree) {
    match unit {
        UnitTree::Function(def) => visitor.visit_func_def(def),
        UnitTree::Class(def) => visitor.visit_class_def(def),
    }
}

pub fn walk_func_def<V: Visitor + ?Sized>(visitor: &mut V, def: &FunctionDef) {
    for stmt in &def.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_class_def<V: Visitor + ?Sized>(visitor: &mut V, def: &ClassDef) {
    for stmt in &def.body {
        visitor.visit_stmt(stmt);
    }
    for method in &def.methods {
        visitor.visit_func_def(method);
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::Assign { targets, value, .. } => {
            for target in targets {
                visitor.visit_expr(target);
            }
            visitor.visit_expr(value);
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Raise(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Assert(expr) => visitor.visit_expr(expr),
        StmtKind::If { arms } => {
            for (cond, body) in arms {
                if let Some(cond) = cond {
                    visitor.visit_expr(cond);
                }
                for stmt in body {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        StmtKind::While { cond, body } => {
            visitor.visit_expr(cond);
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::For {
            target,
            iter,
            body,
            else_body,
        } => {
            visitor.visit_expr(target);
            visitor.visit_expr(iter);
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
            for stmt in else_body {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::Try {
            body,
            handlers,
            finally_body,
        } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
            for handler in handlers {
                for stmt in &handler.body {
                    visitor.visit_stmt(stmt);
                }
            }
            for stmt in finally_body {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::With { body } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::FuncDef(def) => visitor.visit_func_def(def),
        StmtKind::Import | StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Name(_)
        | ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Bool(_)
        | ExprKind::NoneLit => {}
        ExprKind::Call { callee, args } => {
            visitor.visit_expr(callee);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        ExprKind::Attribute { target, .. } => visitor.visit_expr(target),
        ExprKind::Index { target, index } => {
            visitor.visit_expr(target);
            visitor.visit_expr(index);
        }
        ExprKind::Slice { target, parts } => {
            visitor.visit_expr(target);
            for part in parts.iter().flatten() {
                visitor.visit_expr(part);
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Compare { lhs, rhs, .. } => {
            visitor.visit_expr(lhs);
            visitor.visit_expr(rhs);
        }
        ExprKind::Unary { operand, .. } => visitor.visit_expr(operand),
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            for item in items {
                visitor.visit_expr(item);
            }
        }
        ExprKind::Dict(pairs) => {
            for (key, value) in pairs {
                visitor.visit_expr(key);
                visitor.visit_expr(value);
            }
        }
        ExprKind::Lambda { body } => visitor.visit_expr(body),
        ExprKind::Ternary {
            cond,
            then,
            or_else,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_expr(then);
            visitor.visit_expr(or_else);
        }
        ExprKind::Comprehension { elem, iter, cond } => {
            visitor.visit_expr(elem);
            visitor.visit_expr(iter);
            if let Some(cond) = cond {
                visitor.visit_expr(cond);
            }
        }
        ExprKind::Yield(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        ExprKind::Starred(inner) => visitor.visit_expr(inner),
    }
}
