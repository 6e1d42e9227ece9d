//! Program model construction
//!
//! Pass 1 registers every top-level function and variable. Pass 2 walks
//! bodies and initializers for references, once all names are known.
//! Pass 3 groups symbols by file.

use std::collections::hash_map::Entry;

use lfix_ast::visit::for_each_expr;
use lfix_ast::{DeclId, DeclKind, Forest, RefShape};
use tracing::{debug, info};

use crate::Program;

impl Program {
    pub fn build(forest: Forest) -> Self {
        let mut program = Program {
            forest,
            ..Default::default()
        };
        program.register_symbols();
        program.collect_references();
        program.group_by_file();

        info!(
            symbols = program.symlist.len(),
            files = program.filetab.len(),
            edges = program.forward.values().map(|s| s.len()).sum::<usize>(),
            "program model built"
        );
        program
    }

    fn register_symbols(&mut self) {
        for (id, decl) in self.forest.iter() {
            if decl.kind() == DeclKind::Type {
                continue;
            }
            self.symlist.push(id);
            self.symset.insert(id);
            self.forward.insert(id, Default::default());
            self.reverse.insert(id, Default::default());

            match self.symtab.entry(decl.name.clone()) {
                Entry::Vacant(e) => {
                    e.insert(id);
                }
                Entry::Occupied(mut e) => {
                    if decl.is_definition() && !self.forest.decl(*e.get()).is_definition() {
                        e.insert(id);
                    }
                }
            }
            debug!(name = %decl.name, id = id.0, "registered symbol");
        }
    }

    fn collect_references(&mut self) {
        let mut edges: Vec<(DeclId, DeclId)> = Vec::new();

        for &cur in &self.symlist {
            for_each_expr(self.forest.decl(cur), |expr| {
                let target = match expr.ref_shape() {
                    Some(RefShape::Name { text, .. }) => self.symtab.get(text).copied(),
                    Some(RefShape::AddrOf(Some(id))) | Some(RefShape::Call(Some(id))) => {
                        self.symset.contains(&id).then_some(id)
                    }
                    _ => None,
                };
                if let Some(target) = target {
                    edges.push((cur, target));
                }
            });
        }

        for (from, to) in edges {
            self.add_edge(from, to);
        }
    }

    fn group_by_file(&mut self) {
        for &id in &self.symlist {
            let path = self.forest.decl_path(id).to_string();
            self.filetab.entry(path).or_default().insert(id);
        }
    }
}
