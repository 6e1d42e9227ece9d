//! Storage-class minimization
//!
//! A definition referenced only from its own output unit gets internal
//! linkage. Roots keep external linkage.

use std::collections::HashSet;

use lfix_ast::Storage;
use lfix_symbols::{OutputMap, Program};
use tracing::{debug, info};

use crate::passes::{PassResult, RefactorPass};
use crate::RefactorError;

pub struct Localize {
    pub roots: Vec<String>,
    pub units: OutputMap,
}

impl Localize {
    pub fn new(roots: Vec<String>, units: OutputMap) -> Self {
        Self { roots, units }
    }
}

impl RefactorPass for Localize {
    fn name(&self) -> &str {
        "localize"
    }

    fn run(&self, program: &mut Program) -> Result<PassResult, RefactorError> {
        let roots: HashSet<_> = self.roots.iter().filter_map(|n| program.lookup(n)).collect();

        let local: Vec<_> = program
            .symbols()
            .iter()
            .copied()
            .filter(|id| !roots.contains(id))
            .filter(|&id| {
                let decl = program.decl(id);
                decl.is_definition() && decl.storage != Storage::Static
            })
            .filter(|&id| {
                let unit = self.units.unit_for(program.file_of(id));
                program
                    .callers(id)
                    .all(|caller| self.units.unit_for(program.file_of(caller)) == unit)
            })
            .collect();

        for &id in &local {
            debug!(name = %program.name(id), "marking static");
            program.decl_mut(id).storage = Storage::Static;
        }

        info!(count = local.len(), "localized symbols");
        Ok(PassResult {
            modified: !local.is_empty(),
            warnings: Vec::new(),
        })
    }
}
