//! Symbol renaming
//!
//! Renames retained symbols and rewrites the references to them. By default
//! references are matched by text, so a local that shadows a renamed global
//! is renamed too.

use std::collections::{BTreeMap, HashMap};

use lfix_ast::visit::for_each_expr_mut;
use lfix_ast::{DeclId, ExprKind};
use lfix_symbols::Program;
use tracing::{debug, info};

use crate::passes::{PassResult, PassWarning, RefactorPass};
use crate::RefactorError;

pub struct Rename {
    pub table: BTreeMap<String, String>,
    pub scope_aware: bool,
}

impl Rename {
    pub fn new(table: BTreeMap<String, String>) -> Self {
        Self {
            table,
            scope_aware: false,
        }
    }

    /// Rewrite only references that resolve to a renamed symbol
    pub fn scope_aware(mut self, on: bool) -> Self {
        self.scope_aware = on;
        self
    }
}

impl RefactorPass for Rename {
    fn name(&self) -> &str {
        "rename"
    }

    fn run(&self, program: &mut Program) -> Result<PassResult, RefactorError> {
        let mut warnings = Vec::new();

        // every symbol is matched by its name before the pass
        let plan: Vec<(DeclId, String)> = program
            .symbols()
            .iter()
            .filter_map(|&id| self.table.get(program.name(id)).map(|new| (id, new.clone())))
            .collect();

        for old in self.table.keys() {
            if !program.symbols().iter().any(|&id| program.name(id) == old.as_str()) {
                warnings.push(PassWarning {
                    code: "W-RENAME-001",
                    message: format!("rename of '{}' has no matching symbol", old),
                });
            }
        }
        for (id, new) in &plan {
            debug!(from = %program.name(*id), to = %new, "renaming symbol");
        }

        program.rename_symbols(&plan);
        let renamed: HashMap<DeclId, String> = plan.into_iter().collect();

        let mut references = 0usize;
        let ids = program.symbols().to_vec();
        for id in ids {
            for_each_expr_mut(program.decl_mut(id), |expr| {
                let ExprKind::Name { text, decl } = &mut expr.kind else {
                    return;
                };
                let new = if self.scope_aware {
                    decl.and_then(|d| renamed.get(&d))
                } else {
                    self.table.get(text.as_str())
                };
                if let Some(new) = new {
                    *text = new.clone();
                    references += 1;
                }
            });
        }

        info!(symbols = renamed.len(), references, "renamed");
        Ok(PassResult {
            modified: !renamed.is_empty() || references > 0,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::tests::program_from;
    use lfix_ast::visit::for_each_expr;
    use lfix_ast::ToC;

    const SRC: &str = r#"
void
chipfloat(void)
{
}

void
span(void)
{
	{
		int chipfloat;

		chipfloat = 1;
	}
	chipfloat();
}
"#;

    fn table() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("chipfloat".to_string(), "chipfloat7".to_string()),
            ("listinit".to_string(), "listinit7".to_string()),
        ])
    }

    fn name_texts(program: &Program, fn_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        for_each_expr(program.decl(program.lookup(fn_name).unwrap()), |e| {
            if let ExprKind::Name { text, .. } = &e.kind {
                out.push(text.clone());
            }
        });
        out
    }

    #[test]
    fn test_rename_symbol_and_references() {
        let mut program = program_from(&[("asm.c", SRC)]);
        let result = Rename::new(table()).run(&mut program).unwrap();
        assert!(result.modified);

        let id = program.lookup("chipfloat7").unwrap();
        assert_eq!(program.name(id), "chipfloat7");
        assert!(program.lookup("chipfloat").is_none());
        // textual rewrite also renames the shadowing local use
        assert_eq!(name_texts(&program, "span"), vec!["chipfloat7", "chipfloat7"]);
        assert!(!program.decl(program.lookup("span").unwrap()).to_c(0).contains("chipfloat()"));
    }

    #[test]
    fn test_missing_rename_is_a_warning() {
        let mut program = program_from(&[("asm.c", SRC)]);
        let result = Rename::new(table()).run(&mut program).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, "W-RENAME-001");
        assert!(result.warnings[0].message.contains("listinit"));
    }

    const CHAIN: &str = r#"
void
a(void)
{
}

void
b(void)
{
	a();
}

void
f(void)
{
	a();
	b();
}
"#;

    fn rename_with(pairs: &[(&str, &str)]) -> Program {
        let mut program = program_from(&[("asm.c", CHAIN)]);
        let table = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let result = Rename::new(table).run(&mut program).unwrap();
        assert!(result.warnings.is_empty());
        program
    }

    fn decl_names(program: &Program) -> Vec<String> {
        program
            .symbols()
            .iter()
            .map(|&id| program.name(id).to_string())
            .collect()
    }

    #[test]
    fn test_chained_table_renames_once() {
        let program = rename_with(&[("a", "b"), ("b", "c")]);
        assert_eq!(decl_names(&program), vec!["b", "c", "f"]);
        assert_eq!(name_texts(&program, "f"), vec!["b", "c"]);
        assert_eq!(name_texts(&program, "c"), vec!["b"]);
        assert_eq!(program.lookup("b"), Some(program.symbols()[0]));
        assert_eq!(program.lookup("c"), Some(program.symbols()[1]));
        assert!(program.lookup("a").is_none());
    }

    #[test]
    fn test_swapped_names() {
        let program = rename_with(&[("a", "b"), ("b", "a")]);
        assert_eq!(decl_names(&program), vec!["b", "a", "f"]);
        assert_eq!(name_texts(&program, "f"), vec!["b", "a"]);
        // the old b now calls the old a under its new name
        assert_eq!(name_texts(&program, "a"), vec!["b"]);
        assert_eq!(program.lookup("b"), Some(program.symbols()[0]));
        assert_eq!(program.lookup("a"), Some(program.symbols()[1]));
    }

    #[test]
    fn test_scope_aware_leaves_locals() {
        let mut program = program_from(&[("asm.c", SRC)]);
        Rename::new(table())
            .scope_aware(true)
            .run(&mut program)
            .unwrap();
        assert_eq!(name_texts(&program, "span"), vec!["chipfloat", "chipfloat7"]);
    }
}
