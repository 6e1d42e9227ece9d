//! Ordered pass driver

use lfix_symbols::Program;
use tracing::{info, warn};

use crate::passes::{Extract, Localize, PassResult, RefactorPass, Rename, Thread};
use crate::{MigrationPlan, RefactorError};

/// Runs passes in order over one program, reporting each finished stage.
pub struct Pipeline {
    passes: Vec<Box<dyn RefactorPass>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn with_pass(mut self, pass: impl RefactorPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// The five migration stages: extract, localize, rename, then thread
    /// `cursym` and the context parameter. `context_fields` are the members
    /// of the plan's context aggregate.
    pub fn from_plan<I, S>(plan: &MigrationPlan, context_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new()
            .with_pass(Extract::new(plan.roots.clone()))
            .with_pass(Localize::new(plan.roots.clone(), plan.output_map()))
            .with_pass(Rename::new(plan.renames.clone()).scope_aware(plan.scope_aware))
            .with_pass(
                Thread::new(format!("thread-{}", plan.cursym.param.name), plan.cursym.clone())
                    .scope_aware(plan.scope_aware),
            )
            .with_pass(
                Thread::new(
                    format!("thread-{}", plan.ctxt.param.name),
                    plan.context_spec(context_fields),
                )
                .scope_aware(plan.scope_aware),
            )
    }

    pub fn passes(&self) -> &[Box<dyn RefactorPass>] {
        &self.passes
    }

    /// Run every pass; `on_stage` sees the program after each one, with the
    /// stage index and pass name.
    pub fn run<E, F>(&self, program: &mut Program, mut on_stage: F) -> Result<Vec<PassResult>, E>
    where
        E: From<RefactorError>,
        F: FnMut(usize, &str, &Program) -> Result<(), E>,
    {
        let mut results = Vec::with_capacity(self.passes.len());

        for (index, pass) in self.passes.iter().enumerate() {
            let result = pass.run(program)?;
            for warning in &result.warnings {
                warn!(pass = pass.name(), code = warning.code, "{}", warning.message);
            }
            info!(
                stage = index,
                pass = pass.name(),
                symbols = program.len(),
                modified = result.modified,
                "stage complete"
            );
            debug_assert!(program.is_symmetric());
            on_stage(index, pass.name(), program)?;
            results.push(result);
        }

        Ok(results)
    }
}
