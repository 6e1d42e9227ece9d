//! Name resolution: binds identifier uses to top-level declarations

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use lfix_ast::visit::{walk_expr_mut, walk_stmt_mut, VisitorMut};
use lfix_ast::{Decl, DeclId, DeclKind, Expr, ExprKind, Forest, Stmt, StmtKind};

/// Map each file-scope function or variable name to its declaration,
/// preferring a definition over earlier declarations.
pub fn global_table(forest: &Forest) -> HashMap<String, DeclId> {
    let mut table: HashMap<String, DeclId> = HashMap::new();
    for (id, decl) in forest.iter() {
        if decl.kind() == DeclKind::Type {
            continue;
        }
        match table.entry(decl.name.clone()) {
            Entry::Vacant(e) => {
                e.insert(id);
            }
            Entry::Occupied(mut e) => {
                if decl.is_definition() && !forest.decl(*e.get()).is_definition() {
                    e.insert(id);
                }
            }
        }
    }
    table
}

/// Resolve every name in the forest. Names bound by a parameter or local
/// declaration stay unresolved.
pub fn resolve(forest: &mut Forest) {
    let mut resolver = Resolver {
        globals: global_table(forest),
        scopes: Vec::new(),
    };
    for decl in &mut forest.decls {
        resolver.resolve_top(decl);
    }
}

struct Resolver {
    globals: HashMap<String, DeclId>,
    scopes: Vec<HashSet<String>>,
}

impl Resolver {
    fn resolve_top(&mut self, decl: &mut Decl) {
        if let Some(init) = &mut decl.init {
            self.visit_init_mut(init);
        }
        let Some(body) = &mut decl.body else {
            return;
        };

        let params = decl
            .ty
            .as_func()
            .map(|f| f.params.iter().filter_map(|p| p.name.clone()).collect())
            .unwrap_or_default();
        self.scopes.push(params);
        for stmt in &mut body.stmts {
            self.visit_stmt_mut(stmt);
        }
        self.scopes.pop();
    }

    fn lookup(&self, name: &str) -> Option<DeclId> {
        if self.scopes.iter().any(|scope| scope.contains(name)) {
            return None;
        }
        self.globals.get(name).copied()
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }
}

impl VisitorMut for Resolver {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Block(block) => {
                self.scopes.push(HashSet::new());
                for s in &mut block.stmts {
                    self.visit_stmt_mut(s);
                }
                self.scopes.pop();
            }
            StmtKind::Decl(decls) => {
                for d in decls {
                    if let Some(init) = &mut d.init {
                        self.visit_init_mut(init);
                    }
                    if !d.name.is_empty() {
                        self.declare(&d.name);
                    }
                }
            }
            _ => walk_stmt_mut(self, stmt),
        }
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let ExprKind::Name { text, decl } = &mut expr.kind {
            *decl = self.lookup(text);
        }
        walk_expr_mut(self, expr);
    }
}
