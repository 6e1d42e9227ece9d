//! Shared fixtures for the end-to-end tests

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lfix::ast::{Frontend, SourceFile, ToC};
use lfix::parser::CFrontend;
use lfix::refactor::MigrationPlan;
use lfix::symbols::Program;

/// The fixture Go tree under tests/fixtures
pub fn goroot() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// The arm64 plan restricted to the files present in the fixture tree
pub fn plan() -> MigrationPlan {
    let mut plan = MigrationPlan::default();
    plan.units = [
        ("asm.c", "asm7.c"),
        ("span.c", "asm7.c"),
        ("asmout.c", "asm7.c"),
        ("list.c", "list7.c"),
        ("noop.c", "obj7.c"),
        ("pass.c", "obj7.c"),
        ("obj.c", "obj7.c"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    plan
}

fn frontend(plan: &MigrationPlan) -> CFrontend {
    CFrontend::default().with_typedefs(plan.typedefs.iter().cloned())
}

fn read(paths: &[PathBuf]) -> Vec<SourceFile> {
    paths
        .iter()
        .map(|p| SourceFile::new(p.to_string_lossy(), fs::read_to_string(p).unwrap()))
        .collect()
}

pub fn load(plan: &MigrationPlan) -> Program {
    let paths = plan.source_paths(&goroot()).unwrap();
    Program::build(frontend(plan).read_many(&read(&paths)).unwrap())
}

/// Members of the plan's context aggregate, read from the fixture header
pub fn context_fields(plan: &MigrationPlan) -> Vec<String> {
    let header = read(&[goroot().join(&plan.ctxt.header)]);
    frontend(plan)
        .read_many(&header)
        .unwrap()
        .aggregate_fields(&plan.ctxt.aggregate)
        .unwrap()
}

/// Every retained symbol printed as C, by name
pub fn printed(program: &Program) -> BTreeMap<String, String> {
    program
        .symbols()
        .iter()
        .map(|&id| (program.name(id).to_string(), program.decl(id).to_c(0)))
        .collect()
}
