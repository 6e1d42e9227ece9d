//! lfix-symbols: Program model builder
//!
//! Turns a parsed [`Forest`](lfix_ast::Forest) into a [`Program`]:
//! - Register top-level functions and variables as symbols
//! - Record forward references from bodies and initializers
//! - Mirror them as reverse references
//! - Group symbols by declaring file
//!
//! The refactoring passes mutate the `Program` in place; the forward and
//! reverse maps stay symmetric through every mutation.

mod builder;
mod program;
mod units;

pub use program::Program;
pub use units::{basename, OutputMap};

#[cfg(test)]
mod tests {
    use super::*;
    use lfix_ast::{Frontend, SourceFile};
    use lfix_parser::CFrontend;
    use std::collections::{BTreeMap, HashSet};

    fn build(files: &[(&str, &str)]) -> Program {
        let sources: Vec<_> = files
            .iter()
            .map(|(path, text)| SourceFile::new(*path, *text))
            .collect();
        let forest = CFrontend::default().read_many(&sources).unwrap();
        Program::build(forest)
    }

    fn names(program: &Program, ids: impl Iterator<Item = lfix_ast::DeclId>) -> Vec<String> {
        let mut v: Vec<_> = ids.map(|id| program.name(id).to_string()).collect();
        v.sort();
        v
    }

    const ASM: &str = r#"
int pc;
static int tmp;
void chipfloat(void);

void
span(void)
{
	int local;

	local = pc;
	chipfloat();
}

void
chipfloat(void)
{
	tmp++;
}
"#;

    #[test]
    fn test_registers_functions_and_variables() {
        let program = build(&[("asm.c", ASM)]);
        let all = names(&program, program.symbols().iter().copied());
        assert_eq!(all, vec!["chipfloat", "chipfloat", "pc", "span", "tmp"]);
        // the name table binds to the definition, not the prototype
        let id = program.lookup("chipfloat").unwrap();
        assert!(program.decl(id).is_function_definition());
    }

    #[test]
    fn test_forward_and_reverse_edges() {
        let program = build(&[("asm.c", ASM)]);
        let span = program.lookup("span").unwrap();
        let chipfloat = program.lookup("chipfloat").unwrap();

        assert_eq!(names(&program, program.callees(span)), vec!["chipfloat", "pc"]);
        assert_eq!(names(&program, program.callers(chipfloat)), vec!["span"]);
        assert_eq!(names(&program, program.callees(chipfloat)), vec!["tmp"]);
        assert!(program.is_symmetric());
    }

    #[test]
    fn test_initializer_and_address_edges() {
        let source = r#"
void noop(void) {}
void (*handlers[])(void) = { noop };
int counter;
int *pcounter = &counter;
"#;
        let program = build(&[("pass.c", source)]);
        let handlers = program.lookup("handlers").unwrap();
        let pcounter = program.lookup("pcounter").unwrap();
        assert_eq!(names(&program, program.callees(handlers)), vec!["noop"]);
        assert_eq!(names(&program, program.callees(pcounter)), vec!["counter"]);
    }

    #[test]
    fn test_types_are_not_symbols() {
        let program = build(&[(
            "l.h",
            "typedef struct Optab Optab;\nstruct Optab { int as; };\nOptab optab[1];\n",
        )]);
        assert_eq!(program.len(), 1);
        assert_eq!(program.name(program.symbols()[0]), "optab");
    }

    #[test]
    fn test_file_table() {
        let program = build(&[
            ("src/cmd/7l/asm.c", "void span(void) { follow(); }\n"),
            ("src/cmd/7l/noop.c", "void follow(void) {}\n"),
        ]);
        let files: Vec<_> = program.files().keys().cloned().collect();
        assert_eq!(files, vec!["src/cmd/7l/asm.c", "src/cmd/7l/noop.c"]);
        let follow = program.lookup("follow").unwrap();
        assert_eq!(program.file_of(follow), "src/cmd/7l/noop.c");
    }

    #[test]
    fn test_retain_filters_every_index() {
        let mut program = build(&[("asm.c", ASM)]);
        let keep: HashSet<_> = ["span", "chipfloat", "tmp"]
            .iter()
            .filter_map(|n| program.lookup(n))
            .collect();
        program.retain(&keep);

        assert_eq!(program.len(), 3);
        assert!(program.lookup("pc").is_none());
        let span = program.lookup("span").unwrap();
        assert_eq!(names(&program, program.callees(span)), vec!["chipfloat"]);
        assert!(program.is_symmetric());
        assert!(program.is_closed());
    }

    #[test]
    fn test_rename_rebinds_name_table() {
        let mut program = build(&[("asm.c", ASM)]);
        let id = program.lookup("chipfloat").unwrap();
        program.rename_symbols(&[(id, "chipfloat7".to_string())]);
        assert_eq!(program.lookup("chipfloat7"), Some(id));
        assert_eq!(program.lookup("chipfloat"), None);
        assert_eq!(program.name(id), "chipfloat7");
    }

    #[test]
    fn test_output_map() {
        let units = BTreeMap::from([
            ("asm.c".to_string(), "asm7.c".to_string()),
            ("span.c".to_string(), "asm7.c".to_string()),
            ("list.c".to_string(), "list7.c".to_string()),
        ]);
        let map = OutputMap::new(units, "l.h", "zzz.c");
        assert_eq!(map.unit_for("src/cmd/7l/span.c"), "asm7.c");
        assert_eq!(map.unit_for("src/cmd/7l/l.h"), "l.h");
        assert_eq!(map.unit_for("src/cmd/7l/other.c"), "zzz.c");
        assert_eq!(map.sources_of("asm7.c"), vec!["asm.c", "span.c"]);
        assert_eq!(basename("a/b/c.h"), "c.h");
    }
}
