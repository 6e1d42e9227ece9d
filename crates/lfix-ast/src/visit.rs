//! Preorder traversal over declarations, statements and expressions

use crate::{Decl, Expr, ExprKind, Init, Designator, Stmt, StmtKind};

/// Read-only visitor. Override a method and call the matching `walk_*`
/// function to keep descending.
pub trait Visitor {
    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_init(&mut self, init: &Init) {
        walk_init(self, init);
    }
}

pub fn walk_decl<V: Visitor + ?Sized>(v: &mut V, decl: &Decl) {
    if let Some(init) = &decl.init {
        v.visit_init(init);
    }
    if let Some(body) = &decl.body {
        for stmt in &body.stmts {
            v.visit_stmt(stmt);
        }
    }
}

pub fn walk_init<V: Visitor + ?Sized>(v: &mut V, init: &Init) {
    match init {
        Init::Expr(e) => v.visit_expr(e),
        Init::List(items) => {
            for item in items {
                v.visit_init(item);
            }
        }
        Init::Designated { designator, init } => {
            if let Designator::Index(e) = designator {
                v.visit_expr(e);
            }
            v.visit_init(init);
        }
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Empty
        | StmtKind::Default
        | StmtKind::Label(_)
        | StmtKind::Goto(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Return(None) => {}
        StmtKind::Expr(e) | StmtKind::Case(e) | StmtKind::Return(Some(e)) => v.visit_expr(e),
        StmtKind::Decl(decls) => {
            for d in decls {
                v.visit_decl(d);
            }
        }
        StmtKind::Block(block) => {
            for s in &block.stmts {
                v.visit_stmt(s);
            }
        }
        StmtKind::If {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr(cond);
            v.visit_stmt(then);
            if let Some(s) = otherwise {
                v.visit_stmt(s);
            }
        }
        StmtKind::While { cond, body } | StmtKind::Switch { cond, body } => {
            v.visit_expr(cond);
            v.visit_stmt(body);
        }
        StmtKind::DoWhile { body, cond } => {
            v.visit_stmt(body);
            v.visit_expr(cond);
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            for e in [init, cond, step].into_iter().flatten() {
                v.visit_expr(e);
            }
            v.visit_stmt(body);
        }
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Name { .. }
        | ExprKind::Number(_)
        | ExprKind::Char(_)
        | ExprKind::Str(_)
        | ExprKind::SizeofType(_) => {}
        ExprKind::Paren(e)
        | ExprKind::Unary { operand: e, .. }
        | ExprKind::Postfix { operand: e, .. }
        | ExprKind::Cast { expr: e, .. }
        | ExprKind::SizeofExpr(e)
        | ExprKind::VaArg { ap: e, .. }
        | ExprKind::Member { base: e, .. } => v.visit_expr(e),
        ExprKind::Binary { left, right, .. } | ExprKind::Comma { left, right } => {
            v.visit_expr(left);
            v.visit_expr(right);
        }
        ExprKind::Assign { target, value, .. } => {
            v.visit_expr(target);
            v.visit_expr(value);
        }
        ExprKind::Cond {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr(cond);
            v.visit_expr(then);
            v.visit_expr(otherwise);
        }
        ExprKind::Call { callee, args } => {
            v.visit_expr(callee);
            for a in args {
                v.visit_expr(a);
            }
        }
        ExprKind::Index { base, index } => {
            v.visit_expr(base);
            v.visit_expr(index);
        }
    }
}

/// Mutating visitor. The node is handed to the override before its children
/// are walked, so rewrites made there are seen by the descent.
pub trait VisitorMut {
    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    fn visit_init_mut(&mut self, init: &mut Init) {
        walk_init_mut(self, init);
    }
}

pub fn walk_decl_mut<V: VisitorMut + ?Sized>(v: &mut V, decl: &mut Decl) {
    if let Some(init) = &mut decl.init {
        v.visit_init_mut(init);
    }
    if let Some(body) = &mut decl.body {
        for stmt in &mut body.stmts {
            v.visit_stmt_mut(stmt);
        }
    }
}

pub fn walk_init_mut<V: VisitorMut + ?Sized>(v: &mut V, init: &mut Init) {
    match init {
        Init::Expr(e) => v.visit_expr_mut(e),
        Init::List(items) => {
            for item in items {
                v.visit_init_mut(item);
            }
        }
        Init::Designated { designator, init } => {
            if let Designator::Index(e) = designator {
                v.visit_expr_mut(e);
            }
            v.visit_init_mut(init);
        }
    }
}

pub fn walk_stmt_mut<V: VisitorMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Empty
        | StmtKind::Default
        | StmtKind::Label(_)
        | StmtKind::Goto(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Return(None) => {}
        StmtKind::Expr(e) | StmtKind::Case(e) | StmtKind::Return(Some(e)) => v.visit_expr_mut(e),
        StmtKind::Decl(decls) => {
            for d in decls {
                v.visit_decl_mut(d);
            }
        }
        StmtKind::Block(block) => {
            for s in &mut block.stmts {
                v.visit_stmt_mut(s);
            }
        }
        StmtKind::If {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr_mut(cond);
            v.visit_stmt_mut(then);
            if let Some(s) = otherwise {
                v.visit_stmt_mut(s);
            }
        }
        StmtKind::While { cond, body } | StmtKind::Switch { cond, body } => {
            v.visit_expr_mut(cond);
            v.visit_stmt_mut(body);
        }
        StmtKind::DoWhile { body, cond } => {
            v.visit_stmt_mut(body);
            v.visit_expr_mut(cond);
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            for e in [init, cond, step].into_iter().flatten() {
                v.visit_expr_mut(e);
            }
            v.visit_stmt_mut(body);
        }
    }
}

pub fn walk_expr_mut<V: VisitorMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Name { .. }
        | ExprKind::Number(_)
        | ExprKind::Char(_)
        | ExprKind::Str(_)
        | ExprKind::SizeofType(_) => {}
        ExprKind::Paren(e)
        | ExprKind::Unary { operand: e, .. }
        | ExprKind::Postfix { operand: e, .. }
        | ExprKind::Cast { expr: e, .. }
        | ExprKind::SizeofExpr(e)
        | ExprKind::VaArg { ap: e, .. }
        | ExprKind::Member { base: e, .. } => v.visit_expr_mut(e),
        ExprKind::Binary { left, right, .. } | ExprKind::Comma { left, right } => {
            v.visit_expr_mut(left);
            v.visit_expr_mut(right);
        }
        ExprKind::Assign { target, value, .. } => {
            v.visit_expr_mut(target);
            v.visit_expr_mut(value);
        }
        ExprKind::Cond {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr_mut(cond);
            v.visit_expr_mut(then);
            v.visit_expr_mut(otherwise);
        }
        ExprKind::Call { callee, args } => {
            v.visit_expr_mut(callee);
            for a in args {
                v.visit_expr_mut(a);
            }
        }
        ExprKind::Index { base, index } => {
            v.visit_expr_mut(base);
            v.visit_expr_mut(index);
        }
    }
}

struct ExprFn<F>(F);

impl<F: FnMut(&Expr)> Visitor for ExprFn<F> {
    fn visit_expr(&mut self, expr: &Expr) {
        (self.0)(expr);
        walk_expr(self, expr);
    }
}

struct ExprFnMut<F>(F);

impl<F: FnMut(&mut Expr)> VisitorMut for ExprFnMut<F> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        (self.0)(expr);
        walk_expr_mut(self, expr);
    }
}

/// Call `f` on every expression in a declaration's initializer and body, preorder
pub fn for_each_expr(decl: &Decl, f: impl FnMut(&Expr)) {
    ExprFn(f).visit_decl(decl);
}

/// Mutable counterpart of [`for_each_expr`]
pub fn for_each_expr_mut(decl: &mut Decl, f: impl FnMut(&mut Expr)) {
    ExprFnMut(f).visit_decl_mut(decl);
}
