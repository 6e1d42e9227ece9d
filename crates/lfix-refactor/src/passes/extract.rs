//! Reachability extraction
//!
//! Keeps only the symbols reachable from the roots through forward
//! references and drops everything else from the program.

use std::collections::HashSet;

use lfix_ast::DeclId;
use lfix_symbols::Program;
use tracing::info;

use crate::passes::{PassResult, RefactorPass};
use crate::RefactorError;

pub struct Extract {
    pub roots: Vec<String>,
}

impl Extract {
    pub fn new(roots: Vec<String>) -> Self {
        Self { roots }
    }
}

impl RefactorPass for Extract {
    fn name(&self) -> &str {
        "extract"
    }

    fn run(&self, program: &mut Program) -> Result<PassResult, RefactorError> {
        let roots = self
            .roots
            .iter()
            .map(|name| {
                program
                    .lookup(name)
                    .ok_or_else(|| RefactorError::MissingRoot { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let keep = closure(program, roots);
        let before = program.len();
        program.retain(&keep);

        info!(kept = program.len(), dropped = before - program.len(), "extracted closure");
        Ok(PassResult {
            modified: program.len() != before,
            warnings: Vec::new(),
        })
    }
}

/// Every symbol reachable from `roots`, roots included
pub fn closure(program: &Program, roots: impl IntoIterator<Item = DeclId>) -> HashSet<DeclId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<DeclId> = roots.into_iter().collect();

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        stack.extend(program.callees(id).filter(|next| !seen.contains(next)));
    }
    seen
}
