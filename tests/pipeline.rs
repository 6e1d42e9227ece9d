//! End-to-end tests for the migration pipeline
//!
//! These run the five stages over the fixture tree and check each snapshot.

mod common;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use lfix::ast::visit::for_each_expr;
use lfix::ast::{ExprKind, Storage};
use lfix::emit::{snapshot_name, write_diffs, Emitter};
use lfix::refactor::{closure, Pipeline, RefactorError};
use lfix::symbols::Program;

struct Stage {
    name: String,
    symbols: BTreeSet<String>,
    statics: BTreeSet<String>,
    text: BTreeMap<String, String>,
    symmetric: bool,
    closed: bool,
}

fn run_stages() -> (Program, Vec<Stage>) {
    let plan = common::plan();
    let mut program = common::load(&plan);
    let pipeline = Pipeline::from_plan(&plan, common::context_fields(&plan));

    let mut stages = Vec::new();
    pipeline
        .run::<RefactorError, _>(&mut program, |_, name, program| {
            stages.push(Stage {
                name: name.to_string(),
                symbols: program.symbols().iter().map(|&id| program.name(id).to_string()).collect(),
                statics: program
                    .symbols()
                    .iter()
                    .filter(|&&id| program.decl(id).storage == Storage::Static)
                    .map(|&id| program.name(id).to_string())
                    .collect(),
                text: common::printed(program),
                symmetric: program.is_symmetric(),
                closed: program.is_closed(),
            });
            Ok(())
        })
        .unwrap();
    (program, stages)
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn e2e_stage_order() {
    let (_, stages) = run_stages();
    let order: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        order,
        vec!["extract", "localize", "rename", "thread-cursym", "thread-ctxt"]
    );
}

#[test]
fn e2e_extract_keeps_exact_closure() {
    let (_, stages) = run_stages();
    assert_eq!(
        stages[0].symbols,
        names(&[
            "Aconv", "asmout", "autosize", "chipfloat", "curtext", "diag", "firstp", "follow",
            "helper", "instoffset", "listinit", "nerrors", "noops", "oplook", "optab", "pc",
            "regoff", "span",
        ])
    );
}

#[test]
fn e2e_closure_from_single_root() {
    let plan = common::plan();
    let program = common::load(&plan);
    let span = program.lookup("span").unwrap();
    let reached: BTreeSet<_> = closure(&program, [span])
        .into_iter()
        .map(|id| program.name(id).to_string())
        .collect();
    assert!(reached.contains("oplook"));
    assert!(reached.contains("diag"));
    assert!(reached.contains("curtext"));
    assert!(!reached.contains("asmout"));
    assert!(!reached.contains("unused"));
}

#[test]
fn e2e_indices_consistent_after_every_stage() {
    let (program, stages) = run_stages();
    for stage in &stages {
        assert!(stage.symmetric, "{} left asymmetric edges", stage.name);
        assert!(stage.closed, "{} left dangling ids", stage.name);
    }
    assert!(program.is_symmetric());
}

#[test]
fn e2e_localize_marks_single_unit_helpers() {
    let (_, stages) = run_stages();
    let statics = &stages[1].statics;

    // regoff is used from span.c and asmout.c, both in asm7.c
    assert!(statics.contains("regoff"));
    assert!(statics.contains("oplook"));
    assert!(statics.contains("Aconv"));
    assert!(statics.contains("helper"));

    // roots, and symbols used from other units, keep external linkage
    for name in ["span", "asmout", "chipfloat", "follow", "noops", "listinit", "diag"] {
        assert!(!statics.contains(name), "{} became static", name);
    }
    // declarations are never localized
    assert!(!statics.contains("curtext"));
}

#[test]
fn e2e_rename_scenario() {
    let (_, stages) = run_stages();
    let stage = &stages[2];
    for (old, new) in [
        ("span", "span7"),
        ("chipfloat", "chipfloat7"),
        ("listinit", "listinit7"),
        ("noops", "addstacksplit"),
    ] {
        assert!(!stage.symbols.contains(old));
        assert!(stage.symbols.contains(new));
    }
    let span = &stage.text["span7"];
    assert!(span.starts_with("void\nspan7(void)\n"));
    assert!(span.contains("if(chipfloat7() < 0)"));
}

#[test]
fn e2e_no_reference_to_renamed_name() {
    let (program, _) = run_stages();
    for &id in program.symbols() {
        for_each_expr(program.decl(id), |expr| {
            if let ExprKind::Name { text, .. } = &expr.kind {
                assert!(
                    !["span", "chipfloat", "listinit", "noops"].contains(&text.as_str()),
                    "{} still references {}",
                    program.name(id),
                    text
                );
            }
        });
    }
}

#[test]
fn e2e_cursym_threads_along_call_chain() {
    let (_, stages) = run_stages();
    let text = &stages[3].text;

    assert!(text["helper"].contains("helper(LSym *cursym)"));
    assert!(text["helper"].contains("if(cursym->text == nil)"));
    assert!(text["follow"].contains("follow(LSym *cursym)"));
    assert!(text["follow"].contains("\thelper(cursym);"));
    assert!(text["asmout"].contains("asmout(LSym *cursym, Prog *p, Optab *o)"));
    assert!(text["asmout"].contains("\t\tfollow(cursym);"));
    assert!(text["span7"].contains("span7(LSym *cursym)"));
    assert!(text["span7"].contains("for(p = cursym->text; p != nil; p = p->link)"));
    assert!(text["addstacksplit"].contains("addstacksplit(LSym *cursym)"));

    // diag is excluded: signature, body and callers untouched
    assert!(text["diag"].contains("diag(char *fmt, ...)"));
    assert!(text["diag"].contains("if(curtext != nil)"));
    assert!(text["span7"].contains("diag(\"bad float\");"));

    // untouched functions keep their signature
    assert!(text["chipfloat7"].contains("chipfloat7(void)"));
}

#[test]
fn e2e_context_threads_after_cursym() {
    let (_, stages) = run_stages();
    let text = &stages[4].text;

    assert!(text["chipfloat7"].contains("chipfloat7(Link *ctxt)"));
    assert!(text["chipfloat7"].contains("return ctxt->instoffset;"));
    assert!(text["regoff"].contains("regoff(Link *ctxt, Prog *p)"));
    assert!(text["regoff"].contains("ctxt->instoffset = 0;"));
    assert!(text["asmout"].contains("asmout(Link *ctxt, LSym *cursym, Prog *p, Optab *o)"));
    assert!(text["asmout"].contains("v = regoff(ctxt, p);"));
    assert!(text["asmout"].contains("ctxt->pc += v;"));
    assert!(text["span7"].contains("span7(Link *ctxt, LSym *cursym)"));
    assert!(text["span7"].contains("if(chipfloat7(ctxt) < 0)"));
    assert!(text["span7"].contains("regoff(ctxt, p)"));

    // member accesses named like a field are not globals
    assert!(text["regoff"].contains("return p->pc;"));
    // follow never reaches a context field
    assert!(text["follow"].contains("follow(LSym *cursym)"));
}

#[test]
fn e2e_snapshots_and_patches() {
    let plan = common::plan();
    let mut program = common::load(&plan);
    let pipeline = Pipeline::from_plan(&plan, common::context_fields(&plan));
    let emitter = Emitter::new(plan.output_map(), plan.filter.clone(), plan.include_block());
    let out = tempfile::tempdir().unwrap();

    pipeline
        .run::<Box<dyn std::error::Error>, _>(&mut program, |stage, _, program| {
            emitter.emit(program, &out.path().join(snapshot_name(stage)))?;
            Ok(())
        })
        .unwrap();

    for stage in 0..5 {
        let dir = out.path().join(snapshot_name(stage));
        let mut files: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["asm7.c", "l.h", "list7.c", "obj7.c"]);
    }

    let last = out.path().join(snapshot_name(4));
    let asm = fs::read_to_string(last.join("asm7.c")).unwrap();
    assert!(asm.starts_with(
        "//+build ignore\n\n// From asm.c asmout.c span.c \n\n#include <u.h>\n#include <libc.h>\n"
    ));
    assert!(asm.contains("void\nspan7(Link *ctxt, LSym *cursym)\n{"));
    assert!(!asm.contains("unused"));

    let list = fs::read_to_string(last.join("list7.c")).unwrap();
    assert!(list.contains("\ta = va_arg(fp->args, int);"));

    let header = fs::read_to_string(last.join("l.h")).unwrap();
    assert!(header.starts_with("//+build ignore\n\nextern "));
    assert!(header.contains("extern Prog *curtext;\n\n"));
    assert!(!header.contains("#include"));

    let patches = write_diffs(out.path()).unwrap();
    assert_eq!(patches.len(), 5);
    let d04 = fs::read_to_string(out.path().join("d04.patch")).unwrap();
    // empty when diff is not installed
    assert!(d04.is_empty() || d04.contains("+span7(Link *ctxt, LSym *cursym)"));
}
