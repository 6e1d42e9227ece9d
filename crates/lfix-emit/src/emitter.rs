//! Snapshot writer

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lfix_ast::ToC;
use lfix_symbols::{OutputMap, Program};
use tracing::{debug, info};

use crate::EmitError;

/// First line of every emitted file, keeping the snapshot out of builds
pub const BUILD_IGNORE: &str = "//+build ignore";

/// Writes the retained symbols of a program into per-unit files.
#[derive(Debug, Clone)]
pub struct Emitter {
    units: OutputMap,
    filter: String,
    includes: String,
}

/// What one snapshot contains
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Unit name to number of symbols written
    pub files: BTreeMap<String, usize>,
}

impl EmitReport {
    pub fn symbols(&self) -> usize {
        self.files.values().sum()
    }
}

impl Emitter {
    /// `filter` selects symbols by source path substring; `includes` is the
    /// block written at the top of every `.c` unit.
    pub fn new(units: OutputMap, filter: impl Into<String>, includes: impl Into<String>) -> Self {
        Self {
            units,
            filter: filter.into(),
            includes: includes.into(),
        }
    }

    /// Render every unit in memory, in unit name order
    pub fn render(&self, program: &Program) -> BTreeMap<String, String> {
        let mut buffers: BTreeMap<String, String> = BTreeMap::new();

        for &id in program.symbols() {
            let path = program.file_of(id);
            if !path.contains(&self.filter) {
                continue;
            }
            let unit = self.units.unit_for(path);
            let buf = buffers
                .entry(unit.to_string())
                .or_insert_with(|| self.prologue(path, unit));
            buf.push_str(&program.decl(id).to_c(0));
            buf.push_str("\n\n");
        }
        buffers
    }

    fn prologue(&self, path: &str, unit: &str) -> String {
        let mut out = format!("{}\n\n", BUILD_IGNORE);
        if path.ends_with(".c") {
            out.push_str(&format!("// From {} \n\n", self.units.sources_of(unit).join(" ")));
            out.push_str(&self.includes);
            out.push('\n');
        }
        out
    }

    /// Replace `dir` with a fresh directory holding one file per unit
    pub fn emit(&self, program: &Program, dir: &Path) -> Result<EmitReport, EmitError> {
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(EmitError::io(dir))?;
        }
        fs::create_dir_all(dir).map_err(EmitError::io(dir))?;

        let mut report = EmitReport::default();
        for &id in program.symbols() {
            let path = program.file_of(id);
            if path.contains(&self.filter) {
                *report
                    .files
                    .entry(self.units.unit_for(path).to_string())
                    .or_default() += 1;
            }
        }

        for (unit, text) in self.render(program) {
            let path = dir.join(&unit);
            fs::write(&path, text).map_err(EmitError::io(&path))?;
            debug!(file = %path.display(), "wrote unit");
        }

        info!(
            dir = %dir.display(),
            files = report.files.len(),
            symbols = report.symbols(),
            "emitted snapshot"
        );
        Ok(report)
    }
}
