//! Migration plan: everything the pipeline takes from outside the sources

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use lfix_symbols::OutputMap;
use serde::{Deserialize, Serialize};

use crate::passes::{ParamSpec, ThreadSpec};
use crate::RefactorError;

/// Configuration of one migration run.
///
/// The default is the arm64 `7l` to `liblink` migration. A plan file only
/// needs the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationPlan {
    pub name: String,
    /// Source directory relative to the Go root
    pub source_dir: String,
    /// Only symbols from paths containing this are emitted
    pub filter: String,
    /// Source basename to output unit
    pub units: BTreeMap<String, String>,
    pub header_unit: String,
    pub source_unit: String,
    pub roots: Vec<String>,
    pub renames: BTreeMap<String, String>,
    pub cursym: ThreadSpec,
    pub ctxt: ContextPlan,
    /// Lines written after the `// From` banner of each `.c` unit
    pub includes: Vec<String>,
    /// Typedef names the sources use without declaring
    pub typedefs: Vec<String>,
    /// Match renames and triggers by resolved reference instead of by text
    pub scope_aware: bool,
}

/// The context-parameter threading, whose triggers are the fields of an
/// aggregate declared in a header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextPlan {
    pub param: ParamSpec,
    /// Header relative to the Go root
    pub header: String,
    pub aggregate: String,
    pub prefix: String,
    pub exclude: BTreeSet<String>,
    pub require_triggers: bool,
}

impl Default for ContextPlan {
    fn default() -> Self {
        Self {
            param: ParamSpec::new("ctxt", "Link"),
            header: "include/link.h".to_string(),
            aggregate: "Link".to_string(),
            prefix: "ctxt->".to_string(),
            exclude: BTreeSet::new(),
            require_triggers: false,
        }
    }
}

impl Default for MigrationPlan {
    fn default() -> Self {
        Self::arm64()
    }
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl MigrationPlan {
    pub fn arm64() -> Self {
        Self {
            name: "arm64".to_string(),
            source_dir: "src/cmd/7l".to_string(),
            filter: "7l".to_string(),
            units: string_map(&[
                ("dyn.c", "asm7.c"),
                ("sub.c", "xxx.c"),
                ("mod.c", "xxx.c"),
                ("list.c", "list7.c"),
                ("noop.c", "obj7.c"),
                ("elf.c", "xxx.c"),
                ("pass.c", "obj7.c"),
                ("pobj.c", "xxx.c"),
                ("asm.c", "asm7.c"),
                ("optab.c", "asm7.c"),
                ("obj.c", "obj7.c"),
                ("span.c", "asm7.c"),
                ("asmout.c", "asm7.c"),
            ]),
            header_unit: "l.h".to_string(),
            source_unit: "zzz.c".to_string(),
            roots: strings(&["span", "asmout", "chipfloat", "follow", "noops", "listinit"]),
            renames: string_map(&[
                ("span", "span7"),
                ("chipfloat", "chipfloat7"),
                ("listinit", "listinit7"),
                ("noops", "addstacksplit"),
            ]),
            cursym: ThreadSpec {
                param: ParamSpec::new("cursym", "LSym"),
                triggers: string_map(&[("curtext", "cursym->text"), ("firstp", "cursym->text")]),
                exclude: BTreeSet::from(["diag".to_string()]),
                require_triggers: true,
            },
            ctxt: ContextPlan::default(),
            includes: strings(&[
                "#include <u.h>",
                "#include <libc.h>",
                "#include <bio.h>",
                "#include <link.h>",
                "#include \"../cmd/7l/7.out.h\"",
            ]),
            typedefs: strings(&["Prog", "Sym", "Adr", "Auto", "Optab", "Oprang", "Opcross", "Link", "LSym"]),
            scope_aware: false,
        }
    }

    /// Load a plan file; fields it omits keep their defaults
    pub fn load(path: &Path) -> Result<Self, RefactorError> {
        let text = std::fs::read_to_string(path).map_err(|source| RefactorError::PlanIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| RefactorError::PlanJson {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Files to parse under `goroot`: the headers of the source directory,
    /// then every source named in the unit map, each group sorted.
    ///
    /// The sources carry no preprocessor, so headers are read explicitly.
    pub fn source_paths(&self, goroot: &Path) -> Result<Vec<PathBuf>, RefactorError> {
        let dir = goroot.join(&self.source_dir);
        let dir_error = |source: std::io::Error| RefactorError::SourceDir {
            path: dir.clone(),
            source,
        };

        let mut headers = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(dir_error)? {
            let path = entry.map_err(dir_error)?.path();
            if path.extension().is_some_and(|ext| ext == "h") {
                headers.push(path);
            }
        }
        headers.sort();

        let sources = self.units.keys().map(|name| dir.join(name));
        Ok(headers.into_iter().chain(sources).collect())
    }

    pub fn output_map(&self) -> OutputMap {
        OutputMap::new(self.units.clone(), &self.header_unit, &self.source_unit)
    }

    /// The include lines as one block, each line terminated
    pub fn include_block(&self) -> String {
        self.includes.iter().map(|line| format!("{}\n", line)).collect()
    }

    /// Threading spec for the context parameter given the aggregate's fields
    pub fn context_spec<I, S>(&self, fields: I) -> ThreadSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = ThreadSpec::prefixed(self.ctxt.param.clone(), fields, &self.ctxt.prefix);
        spec.exclude = self.ctxt.exclude.clone();
        spec.require_triggers = self.ctxt.require_triggers;
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_arm64_defaults() {
        let plan = MigrationPlan::default();
        assert_eq!(plan.units.len(), 13);
        let map = plan.output_map();
        assert_eq!(map.unit_for("src/cmd/7l/span.c"), "asm7.c");
        assert_eq!(map.unit_for("src/cmd/7l/noop.c"), "obj7.c");
        assert_eq!(
            map.sources_of("asm7.c"),
            vec!["asm.c", "asmout.c", "dyn.c", "optab.c", "span.c"]
        );
        assert_eq!(plan.renames["noops"], "addstacksplit");
        assert!(plan.include_block().ends_with("#include \"../cmd/7l/7.out.h\"\n"));
    }

    #[test]
    fn test_partial_plan_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "roots": ["span"], "ctxt": {{ "exclude": ["diag"] }}, "scope_aware": true }}"#
        )
        .unwrap();

        let plan = MigrationPlan::load(file.path()).unwrap();
        assert_eq!(plan.roots, vec!["span"]);
        assert!(plan.scope_aware);
        assert_eq!(plan.ctxt.prefix, "ctxt->");
        assert!(plan.ctxt.exclude.contains("diag"));
        assert_eq!(plan.filter, "7l");
    }

    #[test]
    fn test_malformed_plan() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"roots\": 3 }}").unwrap();
        let err = MigrationPlan::load(file.path()).unwrap_err();
        assert!(matches!(err, RefactorError::PlanJson { .. }));

        let err = MigrationPlan::load(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert!(matches!(err, RefactorError::PlanIo { .. }));
    }

    #[test]
    fn test_source_paths_headers_first() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("src/cmd/7l");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("l.h"), "").unwrap();
        std::fs::write(dir.join("7.out.h"), "").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();

        let mut plan = MigrationPlan::default();
        plan.units = string_map(&[("span.c", "asm7.c"), ("asm.c", "asm7.c")]);
        let names: Vec<_> = plan
            .source_paths(root.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["7.out.h", "l.h", "asm.c", "span.c"]);

        let err = plan.source_paths(Path::new("/nonexistent")).unwrap_err();
        assert!(matches!(err, RefactorError::SourceDir { .. }));
    }

    #[test]
    fn test_context_spec() {
        let plan = MigrationPlan::default();
        let spec = plan.context_spec(["arch", "instoffset"]);
        assert_eq!(spec.param.name, "ctxt");
        assert_eq!(spec.triggers["instoffset"], "ctxt->instoffset");
        assert!(!spec.require_triggers);
    }
}
