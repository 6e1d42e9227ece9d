//! Program-rewriting passes

mod extract;
mod localize;
mod rename;
mod thread;

pub use extract::{closure, Extract};
pub use localize::Localize;
pub use rename::Rename;
pub use thread::{ParamSpec, Thread, ThreadSpec};

use lfix_symbols::Program;

use crate::RefactorError;

/// A non-fatal finding reported by a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassWarning {
    pub code: &'static str,
    pub message: String,
}

/// Outcome of running one pass
#[derive(Debug, Clone, Default)]
pub struct PassResult {
    /// Whether the pass changed the program
    pub modified: bool,
    pub warnings: Vec<PassWarning>,
}

/// One stage of the migration. Passes mutate the program in place and see
/// every rewrite made by the passes before them.
pub trait RefactorPass {
    fn name(&self) -> &str;

    fn run(&self, program: &mut Program) -> Result<PassResult, RefactorError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use lfix_ast::{Frontend, SourceFile};
    use lfix_parser::CFrontend;
    use lfix_symbols::Program;

    pub(crate) fn program_from(files: &[(&str, &str)]) -> Program {
        let sources: Vec<_> = files
            .iter()
            .map(|(path, text)| SourceFile::new(*path, *text))
            .collect();
        let forest = CFrontend::default()
            .read_many(&sources)
            .expect("fixture should parse");
        Program::build(forest)
    }
}
